//! Enrichment prompt construction.

use crate::models::{block_name, ProfileField, Respondent};
use std::collections::BTreeMap;

/// Build the enrichment prompt for one respondent.
///
/// Lists the respondent's metadata and raw answers per named block, then
/// asks for a JSON object with exactly the profile keys.
pub fn build_enrichment_prompt(
    respondent: &Respondent,
    values_by_block: &BTreeMap<u32, Vec<u8>>,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "Analyze the questionnaire answers below and describe the student's learning profile.\n\n",
    );

    prompt.push_str("Student:\n");
    prompt.push_str(&format!("- Name: {}\n", respondent.name));
    prompt.push_str(&format!("- Grade: {}\n", respondent.grade_label));
    prompt.push_str(&format!("- Age: {}\n\n", respondent.age));

    prompt.push_str("Answers per block (scale 1 = strongly disagree, 5 = strongly agree):\n");
    for (block, values) in values_by_block {
        let rendered = if values.is_empty() {
            "no answers".to_string()
        } else {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        prompt.push_str(&format!("- {}: {}\n", block_name(*block), rendered));
    }

    prompt.push_str("\nRespond with a JSON object containing these keys, each a short text:\n");
    for field in ProfileField::ALL {
        prompt.push_str(&format!("- \"{}\"\n", field.key()));
    }
    prompt.push_str(
        "\nFor \"profile_type\" use one of: neurotypical, adhd, autism, gifted, dyslexia, mixed.\n\
         Describe tendencies only; indicators are not diagnoses.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respondent() -> Respondent {
        Respondent {
            name: "Bruno".to_string(),
            grade_label: "5th Grade".to_string(),
            age: 10,
            cohort: None,
        }
    }

    #[test]
    fn test_prompt_lists_blocks_and_keys() {
        let mut values = BTreeMap::new();
        values.insert(1, vec![4, 5, 3]);
        values.insert(2, Vec::new());

        let prompt = build_enrichment_prompt(&respondent(), &values);

        assert!(prompt.contains("- Name: Bruno"));
        assert!(prompt.contains("- Age: 10"));
        assert!(prompt.contains("- Sensory Perception: 4, 5, 3"));
        assert!(prompt.contains("- Attention & Focus: no answers"));
        for field in ProfileField::ALL {
            assert!(prompt.contains(&format!("\"{}\"", field.key())));
        }
    }
}
