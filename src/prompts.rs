//! Fixed instruction texts sent to the oracle.

/// Prescription photo analysis. Asks for one JSON object in the shape the
/// report renderer reads; the oracle may still ignore it.
pub const PRESCRIPTION_ANALYSIS: &str = r#"Analyze this prescription image and provide the following information in JSON format:
1. List of medicines with their:
   - Name and dosage
   - Purpose/disease
   - Usage instructions
   - Warnings or contraindications
   - Dosage appropriateness (flag if suspicious)
   - Generic alternatives (include name and approximate cost savings percentage)
2. Dietary recommendations:
   - List of foods to eat that can help with the condition
   - List of foods to avoid that might interfere with the medication or condition
3. Patient information (if available)
4. Prescriber information
5. Additional details like manufacturer, lot number, etc.

Format the response as a proper JSON object with the following structure:
{
    "patient_name": "...",
    "date": "...",
    "prescriber": "...",
    "medicines": [{
        "name": "...",
        "dosage": "...",
        "purpose": "...",
        "instructions": "...",
        "warnings": "...",
        "dosage_appropriate": "...",
        "generic_alternatives": [{
            "name": "...",
            "cost_saving": number
        }]
    }],
    "dietary_recommendations": {
        "foods_to_eat": ["..."],
        "foods_to_avoid": ["..."]
    },
    "manufacturer": "...",
    "lot_number": "...",
    "expiration_date": "..."
}"#;

const CHAT_PREAMBLE: &str = "Act as a medical expert and answer in 200 characters. \
Answer this health query in a professional but understandable way: ";

/// Short health-chat answer for a free-text question.
pub fn chat_prompt(message: &str) -> String {
    format!("{CHAT_PREAMBLE}{}", message.trim())
}

/// Details a patient supplies for disease prediction.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PatientDetails {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub medical_history: String,
}

pub fn disease_prompt(details: &PatientDetails) -> String {
    format!(
        "Act as a medical expert. Predict possible diseases based on these details:\n\
         - Age: {}\n\
         - Gender: {}\n\
         - Symptoms: {}\n\
         - Medical History: {}\n\n\
         Provide potential diagnoses in order of likelihood, possible next steps, \
         and when to seek urgent care.\n\
         Use clear language without medical jargon. Answer in 450 characters.",
        details.age.trim(),
        details.gender.trim(),
        details.symptoms.trim(),
        details.medical_history.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_names_every_report_key() {
        for key in [
            "patient_name",
            "prescriber",
            "medicines",
            "generic_alternatives",
            "cost_saving",
            "dosage_appropriate",
            "foods_to_eat",
            "foods_to_avoid",
            "manufacturer",
            "lot_number",
            "expiration_date",
        ] {
            assert!(PRESCRIPTION_ANALYSIS.contains(key), "missing {key}");
        }
    }

    #[test]
    fn chat_prompt_appends_message() {
        let prompt = chat_prompt("  Is ibuprofen safe with coffee? ");
        assert!(prompt.starts_with("Act as a medical expert"));
        assert!(prompt.ends_with("way: Is ibuprofen safe with coffee?"));
    }

    #[test]
    fn disease_prompt_lists_details() {
        let prompt = disease_prompt(&PatientDetails {
            age: "42".into(),
            gender: "female".into(),
            symptoms: "fever, cough".into(),
            medical_history: "asthma".into(),
        });
        assert!(prompt.contains("- Age: 42\n"));
        assert!(prompt.contains("- Gender: female\n"));
        assert!(prompt.contains("- Symptoms: fever, cough\n"));
        assert!(prompt.contains("- Medical History: asthma\n"));
        assert!(prompt.ends_with("Answer in 450 characters."));
    }
}
