//! Pack validation. Gates saving from the editor, importing into the store
//! and starting a game; stops at the first problem found.

use crate::error::ValidationError;
use crate::fen;
use crate::model::Pack;

pub fn validate_pack(pack: &Pack) -> Result<(), ValidationError> {
    if pack.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if pack.categories.is_empty() {
        return Err(ValidationError::NoCategories);
    }

    for (ci, cat) in pack.categories.iter().enumerate() {
        if cat.name.trim().is_empty() {
            return Err(ValidationError::MissingCategoryName { position: ci + 1 });
        }
        if cat.questions.is_empty() {
            return Err(ValidationError::EmptyCategory {
                category: cat.name.clone(),
            });
        }

        for (qi, q) in cat.questions.iter().enumerate() {
            let position = qi + 1;
            if q.question.trim().is_empty() {
                return Err(ValidationError::MissingQuestionText {
                    category: cat.name.clone(),
                    position,
                });
            }
            if q.answer.trim().is_empty() {
                return Err(ValidationError::MissingAnswerText {
                    category: cat.name.clone(),
                    position,
                });
            }
            if let Some(fen) = q.position() {
                fen::parse_fen(fen).map_err(|e| ValidationError::InvalidFen {
                    category: cat.name.clone(),
                    position,
                    reason: e.to_string(),
                })?;
            }
        }
    }

    Ok(())
}
