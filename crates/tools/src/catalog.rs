//! The tool catalog sent to the model on every call.

use deckhand_core::operation::Operation;
use deckhand_core::provider::ToolDefinition;
use serde_json::json;

/// One definition per [`Operation`], in declaration order.
pub fn definitions() -> Vec<ToolDefinition> {
    Operation::ALL.into_iter().map(definition).collect()
}

pub fn definition(op: Operation) -> ToolDefinition {
    ToolDefinition {
        name: op.name().to_string(),
        description: description(op).to_string(),
        parameters: parameters_schema(op),
    }
}

fn description(op: Operation) -> &'static str {
    match op {
        Operation::InitializeDocument => {
            "Creates the presentation (or clears the configured template) so slides can be added. \
             Call this first, exactly once."
        }
        Operation::InsertSlide => {
            "Adds a new slide at the end of the presentation. Use TITLE for the opening slide \
             and TITLE_AND_BODY for content slides."
        }
        Operation::InspectDocument => {
            "Returns every slide created so far with its title and body, plus the session \
             state. Use this to check your work before finalizing."
        }
        Operation::RefineSlide => {
            "Replaces the body (and optionally the title) of an existing slide. \
             Positions are 0-based in creation order."
        }
        Operation::FinalizeDocument => {
            "Shares the presentation with anyone who has the link and returns that link. \
             This must be your last action."
        }
    }
}

fn parameters_schema(op: Operation) -> serde_json::Value {
    match op {
        Operation::InitializeDocument => json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "The title/theme of the presentation"
                }
            },
            "required": ["title"]
        }),
        Operation::InsertSlide => json!({
            "type": "object",
            "properties": {
                "layout": {
                    "type": "string",
                    "enum": ["TITLE", "TITLE_AND_BODY", "TITLE_AND_TWO_COLUMNS", "BLANK"],
                    "description": "The layout type for the slide"
                },
                "title": {
                    "type": "string",
                    "description": "The title text for the slide"
                },
                "body": {
                    "type": "string",
                    "description": "The body text. Use bullet points or short paragraphs; \\n for line breaks."
                }
            },
            "required": ["layout", "title", "body"]
        }),
        Operation::InspectDocument | Operation::FinalizeDocument => json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
        Operation::RefineSlide => json!({
            "type": "object",
            "properties": {
                "position": {
                    "type": "integer",
                    "description": "0-based position of the slide to refine"
                },
                "new_body": {
                    "type": "string",
                    "description": "Replacement body text"
                },
                "new_title": {
                    "type": "string",
                    "description": "Optional replacement title; omit to keep the current one"
                }
            },
            "required": ["position", "new_body"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_definitions_named_after_operations() {
        let defs = definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "initialize_document",
                "insert_slide",
                "inspect_document",
                "refine_slide",
                "finalize_document"
            ]
        );
        for def in &defs {
            assert_eq!(def.parameters["type"], "object");
            assert!(!def.description.is_empty());
            assert!(Operation::from_name(&def.name).is_some());
        }
    }

    #[test]
    fn insert_slide_layout_enum_matches_domain() {
        let def = definition(Operation::InsertSlide);
        let layouts: Vec<&str> = def.parameters["properties"]["layout"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        let expected: Vec<&str> = deckhand_core::SlideLayout::ALL
            .iter()
            .map(|l| l.as_str())
            .collect();
        assert_eq!(layouts, expected);
    }

    #[test]
    fn refine_slide_title_is_optional() {
        let def = definition(Operation::RefineSlide);
        let required = def.parameters["required"].as_array().unwrap();
        assert!(required.contains(&json!("position")));
        assert!(!required.contains(&json!("new_title")));
    }
}
