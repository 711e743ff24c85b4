//! Category suggestion pipeline
//!
//! Past input validation this never fails: any generation, parse or
//! validation problem yields `CategorySuggestion::fallback()`.

use tracing::{debug, warn};

use crate::ai::AIBackend;
use crate::error::{Error, Result};
use crate::models::CategorySuggestion;

/// Suggest a type and category for a description.
///
/// The only error is `Error::EmptyDescription` for blank input.
pub async fn suggest_category<A>(ai: Option<&A>, description: &str) -> Result<CategorySuggestion>
where
    A: AIBackend + ?Sized,
{
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::EmptyDescription);
    }

    let Some(ai) = ai else {
        debug!("No AI backend configured, using default suggestion");
        return Ok(CategorySuggestion::fallback());
    };

    match ai.suggest_category(description).await {
        Ok(suggestion) => {
            debug!(
                kind = %suggestion.suggested_type,
                category = %suggestion.suggested_category,
                confidence = suggestion.confidence,
                "Category suggested"
            );
            Ok(suggestion)
        }
        Err(e) => {
            warn!(error = %e, model = ai.model(), "Category suggestion failed, using default");
            Ok(CategorySuggestion::fallback())
        }
    }
}
