use tras_models::analysis::{AnalysisRequest, ModelResponse};

pub const ANALYST_SYSTEM_PROMPT: &str =
    "You are an expert foreign-exchange trader with over twenty years of experience. \
     You give concrete, risk-managed trade recommendations with exact price levels.";

pub const SYNTHESIZER_SYSTEM_PROMPT: &str =
    "You are a senior foreign-exchange trader reviewing recommendations from several \
     independent analysts. You reconcile them into one final, actionable set of trades.";

/// Layout every model is asked to use for each trade, so the parser can
/// pick the levels out reliably.
pub const TRADE_FORMAT: &str = "\
For EACH recommended trade, write a block in exactly this form:

PAIR: EUR/USD
DIRECTION: BUY or SELL
ENTRY: <single exact price>
STOP LOSS: <single exact price>
TAKE PROFIT: <single exact price>
RATIONALE: <one or two sentences>

Use one exact price per level (no ranges), plain decimal numbers, and leave a blank line between trades.";

/// Prompt asking one analyst for recommendations based on the run's documents.
pub fn analysis_prompt(request: &AnalysisRequest) -> String {
    format!(
        "Analyse current trading opportunities using BOTH of these sources:\n\n\
         1. MARKET COMMENTARY (latest reports on trending currencies):\n\n\
         {documents}\n\
         2. YOUR OWN KNOWLEDGE of current market trends, news and economic events. \
         Validate the commentary, point out discrepancies and add opportunities it misses.\n\n\
         Recommend the trades you would take now, with risk-managed entry, target and stop \
         levels, and flag any high-impact news due today that could reverse the trend.\n\n\
         {format}\n",
        documents = request.combined_text(),
        format = TRADE_FORMAT,
    )
}

/// Label a successful response for the synthesis prompt.
pub fn provenance_label(provider_id: &str) -> String {
    format!("=== {} RECOMMENDATIONS ===", provider_id.to_uppercase())
}

/// Prompt asking the synthesizer to reconcile the successful responses.
/// Only `Ok` responses with text are included.
pub fn synthesis_prompt(request: &AnalysisRequest, responses: &[&ModelResponse]) -> String {
    let labelled: String = responses
        .iter()
        .filter_map(|r| {
            r.text
                .as_deref()
                .map(|text| format!("\n{}\n{}\n", provenance_label(&r.provider_id), text.trim()))
        })
        .collect();

    let names: Vec<String> = responses
        .iter()
        .filter(|r| r.text.is_some())
        .map(|r| r.provider_id.to_uppercase())
        .collect();

    format!(
        "Review the following recommendations from {names}. Each analyst worked from the same \
         market commentary plus their own research.\n\
         {labelled}\n\
         === SOURCE COMMENTARY ===\n{documents}\n\
         Based on all of the above:\n\
         1. Identify the strongest opportunities, especially where analysts agree.\n\
         2. Weigh upcoming high-impact news that could cause sudden reversals.\n\
         3. Give your final recommendations with exact levels suitable for automated monitoring.\n\n\
         {format}\n",
        names = names.join(", "),
        documents = request.combined_text(),
        format = TRADE_FORMAT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tras_models::analysis::{ResponseStatus, SourceDocument};

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(
            vec![SourceDocument {
                name: "summary.json".to_string(),
                content: "USD strength broad based".to_string(),
            }],
            Utc::now(),
        )
    }

    #[test]
    fn analysis_prompt_embeds_documents_and_format() {
        let prompt = analysis_prompt(&request());
        assert!(prompt.contains("=== summary.json ===\nUSD strength broad based"));
        assert!(prompt.contains("STOP LOSS:"));
    }

    #[test]
    fn synthesis_prompt_labels_each_response() {
        let a = ModelResponse::ok("chatgpt", "Buy EUR/USD".into(), 10, 1);
        let b = ModelResponse::ok("claude", "Sell USD/JPY".into(), 12, 2);
        let failed =
            ModelResponse::failed("gemini", ResponseStatus::Failed, "boom".into(), 5, 3);
        let prompt = synthesis_prompt(&request(), &[&a, &b, &failed]);

        assert!(prompt.contains("=== CHATGPT RECOMMENDATIONS ===\nBuy EUR/USD"));
        assert!(prompt.contains("=== CLAUDE RECOMMENDATIONS ===\nSell USD/JPY"));
        assert!(!prompt.contains("GEMINI RECOMMENDATIONS"));
        assert!(prompt.contains("=== SOURCE COMMENTARY ==="));
    }
}
