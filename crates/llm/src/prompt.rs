//! The question-generation prompt.

/// Render the generation prompt for one chunk.
///
/// The chunk text is embedded verbatim; nothing is escaped.
pub fn build_prompt(chunk_text: &str, question_count: usize) -> String {
    format!(
        r#"You are an expert educator creating multiple choice questions. Based on the following text, create {question_count} high-quality multiple choice question(s).

Text:
{chunk_text}

For each question, provide:
1. A clear, well-formatted question
2. 4 answer options (A, B, C, D)
3. The letter of the correct answer
4. A brief explanation of why the correct answer is right

Format your response as JSON with this structure:
{{
    "questions": [
        {{
            "question": "Your question here?",
            "options": {{
                "A": "Option A",
                "B": "Option B",
                "C": "Option C",
                "D": "Option D"
            }},
            "correct_answer": "A",
            "explanation": "Brief explanation of why this is correct"
        }}
    ]
}}

Make sure the questions test understanding, not just memorization. Focus on key concepts, relationships, and applications."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_chunk_and_count() {
        let p = build_prompt("Mitochondria produce ATP. {not json}", 3);
        assert!(p.contains("create 3 high-quality"));
        assert!(p.contains("Text:\nMitochondria produce ATP. {not json}\n"));
        for key in ["\"questions\"", "\"options\"", "\"correct_answer\"", "\"explanation\""] {
            assert!(p.contains(key), "missing {key}");
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(build_prompt("x", 1), build_prompt("x", 1));
        assert_ne!(build_prompt("x", 1), build_prompt("y", 1));
    }
}
