//! Judge prompt construction.

/// Render one source block. `source_num` is the document's 1-based global rank.
pub fn format_source(source_num: usize, doc: &str) -> String {
    format!("\n-----------------\nSource #{}:\n{}\n", source_num, doc)
}

/// Build the relevance-scoring prompt for one chunk of documents.
///
/// `first_source_num` is the global rank of `docs[0]`; numbering continues across chunks
/// so the verdicts of every chunk can be merged by `source_num`.
pub fn build_prompt(query: &str, first_source_num: usize, docs: &[String]) -> String {
    let sources = docs
        .iter()
        .enumerate()
        .map(|(offset, doc)| format_source(first_source_num + offset, doc))
        .collect::<Vec<_>>()
        .join("\n");

    let example = (0..docs.len())
        .map(|offset| {
            format!(
                "  {{\"source_num\": {}, \"score\": \"HR\"|\"SR\"|\"NR\"}}",
                first_source_num + offset
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"**Task: Relevance Scoring**
================================

You will be given a query and a list of sources. Respond only with valid JSON that can be parsed directly, never any other text. Read each source and decide how relevant it is to the query, assigning exactly one of these scores:

* **Highly Relevant (HR)**: The source provides direct, specific information that answers the query or is crucial to generating a response.
* **Somewhat Relevant (SR)**: The source provides some useful information or context that could be used to generate a response, but does not directly answer the query.
* **Not Relevant (NR)**: The source does not provide any useful information or context for answering the query.

**Query:** {query}

**Sources:**
{sources}

**Respond ONLY with a JSON list containing one score per source, in this format:**

[
{example}
]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_use_global_numbering() {
        let docs = vec!["alpha".to_string(), "beta".to_string()];
        let prompt = build_prompt("What is alpha?", 6, &docs);
        assert!(prompt.contains("**Query:** What is alpha?"));
        assert!(prompt.contains("Source #6:\nalpha"));
        assert!(prompt.contains("Source #7:\nbeta"));
        assert!(!prompt.contains("Source #1:"));
        assert!(prompt.contains(r#"{"source_num": 7, "score": "HR"|"SR"|"NR"}"#));
    }

    #[test]
    fn test_format_source_block() {
        assert_eq!(
            format_source(3, "Water is wet"),
            "\n-----------------\nSource #3:\nWater is wet\n"
        );
    }
}
