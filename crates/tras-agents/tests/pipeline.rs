//! End-to-end run through the analysis pipeline with scripted providers:
//! fan-out with retries, synthesis, then parsing into trade signals.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal_macros::dec;
use tras_agents::test_support::{
    fast_retry_policy, ScriptedProvider, Step, EURUSD_LONG_RECOMMENDATION,
};
use tras_agents::{
    ModelClient, ModelProvider, Orchestrator, ProviderError, RecommendationParser,
    SynthesisOutcome, Synthesizer,
};
use tras_models::analysis::{AnalysisRequest, ResponseStatus, SourceDocument};
use tras_models::signal::Direction;

fn request() -> AnalysisRequest {
    AnalysisRequest::new(
        vec![SourceDocument {
            name: "fx_summary.txt".to_string(),
            content: "Soft payrolls, dollar under pressure.".to_string(),
        }],
        Utc::now(),
    )
}

#[tokio::test]
async fn slow_provider_recovers_and_signal_is_extracted() {
    // Two hangs past the 50 ms attempt timeout, then a reply.
    let a = Arc::new(ScriptedProvider::new(
        "a",
        vec![
            Step::hang(Duration::from_millis(200)),
            Step::hang(Duration::from_millis(200)),
            Step::reply("EUR/USD looks bid."),
        ],
    ));
    let b = Arc::new(ScriptedProvider::replying("b", "Buy EUR/USD at 1.1000."));
    let c = Arc::new(ScriptedProvider::replying("c", "EUR/USD long, stop 1.0950."));
    let providers: Vec<Arc<dyn ModelProvider>> = vec![a.clone(), b, c];

    let req = request();
    let responses = Orchestrator::new(fast_retry_policy())
        .run(&req, &providers)
        .await;

    let attempts: Vec<u32> = responses.iter().map(|r| r.attempt_count).collect();
    assert_eq!(attempts, vec![3, 1, 1]);
    assert!(responses.iter().all(|r| r.is_ok()));
    assert_eq!(a.calls(), 3);

    let synth = Arc::new(ScriptedProvider::replying(
        "synth",
        EURUSD_LONG_RECOMMENDATION,
    ));
    let outcome = Synthesizer::new(ModelClient::new(synth, fast_retry_policy()))
        .synthesize(&req, &responses)
        .await;
    let rec = match outcome {
        SynthesisOutcome::Synthesized(rec) => rec,
        SynthesisOutcome::Skipped(skip) => panic!("synthesis skipped: {skip:?}"),
    };
    assert_eq!(rec.sources, vec!["a", "b", "c"]);

    let parsed = RecommendationParser::new().unwrap().parse(&rec);
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    assert_eq!(parsed.signals.len(), 1);
    let signal = &parsed.signals[0];
    assert_eq!(signal.instrument.as_str(), "EURUSD");
    assert_eq!(signal.direction, Direction::Long);
    assert_eq!(signal.entry_price, dec!(1.1000));
    assert_eq!(signal.stop_loss, Some(dec!(1.0950)));
    assert_eq!(signal.take_profit, Some(dec!(1.1100)));
    assert_eq!(signal.source_run_id, req.run_id);
}

#[tokio::test]
async fn all_providers_failing_skips_synthesis() {
    let providers: Vec<Arc<dyn ModelProvider>> = vec![
        Arc::new(ScriptedProvider::failing(
            "a",
            ProviderError::Unauthorized("key revoked".into()),
        )),
        Arc::new(ScriptedProvider::new(
            "b",
            vec![Step::hang(Duration::from_millis(200))],
        )),
    ];

    let req = request();
    let responses = Orchestrator::new(fast_retry_policy())
        .run(&req, &providers)
        .await;
    assert_eq!(responses[0].status, ResponseStatus::Failed);
    assert_eq!(responses[0].attempt_count, 1);
    assert_eq!(responses[1].status, ResponseStatus::TimedOut);
    assert_eq!(responses[1].attempt_count, 3);

    let synth = Arc::new(ScriptedProvider::replying("synth", "unused"));
    let outcome = Synthesizer::new(ModelClient::new(synth.clone(), fast_retry_policy()))
        .synthesize(&req, &responses)
        .await;
    assert!(outcome.recommendation().is_none());
    assert_eq!(synth.calls(), 0);
}
