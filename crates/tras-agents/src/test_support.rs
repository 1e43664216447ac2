//! Scripted providers for exercising retry, fan-out and synthesis without
//! network access.
//!
//! A `ScriptedProvider` plays back a list of steps, one per call. Once the
//! script runs out the last step repeats, so a single `Step::fail` models a
//! provider that never recovers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::RetryPolicy;
use crate::error::ProviderError;
use crate::provider::ModelProvider;

#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Fail(ProviderError),
    /// Sleep before replying; long enough hangs trip the attempt timeout.
    Hang(Duration),
}

impl Step {
    pub fn reply(text: &str) -> Self {
        Step::Reply(text.to_string())
    }

    pub fn fail(error: ProviderError) -> Self {
        Step::Fail(error)
    }

    pub fn hang(duration: Duration) -> Self {
        Step::Hang(duration)
    }
}

pub struct ScriptedProvider {
    id: String,
    steps: Vec<Step>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(id: &str, steps: Vec<Step>) -> Self {
        Self {
            id: id.to_string(),
            steps,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `text`.
    pub fn replying(id: &str, text: &str) -> Self {
        Self::new(id, vec![Step::reply(text)])
    }

    /// Always fails with `error`.
    pub fn failing(id: &str, error: ProviderError) -> Self {
        Self::new(id, vec![Step::fail(error)])
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let step = self
            .steps
            .get(n)
            .or_else(|| self.steps.last())
            .cloned()
            .unwrap_or_else(|| Step::Fail(ProviderError::Disabled("empty script".into())));

        match step {
            Step::Reply(text) => Ok(text),
            Step::Fail(e) => Err(e),
            Step::Hang(d) => {
                tokio::time::sleep(d).await;
                Ok(format!("{} answered late", self.id))
            }
        }
    }
}

/// Retry policy with millisecond delays and a 50 ms attempt timeout.
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        attempt_timeout: Duration::from_millis(50),
    }
}

/// A synthesized recommendation in the layout the prompts ask for.
pub const EURUSD_LONG_RECOMMENDATION: &str = "\
Final recommendations after reviewing all three analysts:

PAIR: EUR/USD
DIRECTION: BUY
ENTRY: 1.1000
STOP LOSS: 1.0950
TAKE PROFIT: 1.1100
RATIONALE: All three analysts expect dollar weakness after soft payrolls.
";
