use crate::analyzer::{TokenClass, ValidationResult, classify_tokens};
use crate::lexer::tokenize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightCategory {
    Plain,
    Keyword,
    Operator,
    ValidVariable,
    InvalidVariable,
}

/// A contiguous slice of the input and how to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub text: String,
    /// Byte offsets into the input.
    pub start: usize,
    pub end: usize,
    pub category: HighlightCategory,
}

/// Splits `expression` into categorized spans that cover it end to end.
///
/// Identifiers are classified exactly as the analyzer classified them when it
/// produced `validation`. Variables missing from its validity map (for example
/// after a syntax error) render as plain text.
pub fn highlight(expression: &str, validation: &ValidationResult) -> Vec<HighlightSpan> {
    let tokens = tokenize(expression);
    let classes = classify_tokens(&tokens, validation.keywords_reserved);

    let mut spans: Vec<HighlightSpan> = Vec::new();
    let mut push = |start: usize, end: usize, category: HighlightCategory| {
        if start == end {
            return;
        }
        if let Some(last) = spans.last_mut() {
            if category == HighlightCategory::Plain && last.category == HighlightCategory::Plain {
                last.text.push_str(&expression[start..end]);
                last.end = end;
                return;
            }
        }
        spans.push(HighlightSpan {
            text: expression[start..end].to_string(),
            start,
            end,
            category,
        });
    };

    let mut cursor = 0;
    for (token, class) in tokens.iter().zip(classes) {
        push(cursor, token.span.start, HighlightCategory::Plain);
        let category = match (class, token.ident()) {
            (Some(TokenClass::Keyword), _) => HighlightCategory::Keyword,
            (Some(TokenClass::Operator), _) => HighlightCategory::Operator,
            (Some(TokenClass::Variable), Some(name)) => match validation.is_bound(name) {
                Some(true) => HighlightCategory::ValidVariable,
                Some(false) => HighlightCategory::InvalidVariable,
                None => HighlightCategory::Plain,
            },
            _ => HighlightCategory::Plain,
        };
        push(token.span.start, token.span.end, category);
        cursor = token.span.end;
    }
    push(cursor, expression.len(), HighlightCategory::Plain);
    spans
}
