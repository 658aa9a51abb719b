use crate::domain::ClassificationRequest;

/// Extracted text beyond this many characters adds tokens without adding
/// signal for classification.
const TEXT_EXCERPT_CHARS: usize = 1000;

/// Builds the document-agnostic classification prompt shared by every
/// provider protocol. The same prompt text goes to vision and text-only
/// providers; adapters decide whether the page image rides along.
pub fn build_prompt(request: &ClassificationRequest) -> String {
    let meta = &request.metadata;
    let mut prompt = format!(
        "You are a document classification expert. Analyze this document and classify it.\n\
         \n\
         DOCUMENT METADATA:\n\
         - Filename: {}\n\
         - File Type: {}\n\
         - File Size: {} bytes\n\
         - Pages/Sheets: {}\n",
        meta.filename, meta.file_type, meta.size_bytes, meta.page_count
    );

    for (key, value) in &meta.extra {
        prompt.push_str(&format!("- {}: {}\n", title_case(key), value));
    }

    if request.has_text() {
        prompt.push_str(&format!(
            "\nEXTRACTED TEXT (first {TEXT_EXCERPT_CHARS} characters):\n{}\n",
            excerpt(&request.text, TEXT_EXCERPT_CHARS)
        ));
    } else {
        prompt.push_str("\nEXTRACTED TEXT: None (image-only analysis)\n");
    }

    prompt.push_str(&format!(
        "\nCLASSIFICATION CATEGORIES:\n{}\n\
         \n\
         INSTRUCTIONS:\n\
         1. Analyze both the visual content and extracted text carefully\n\
         2. Consider all metadata provided (filename, file type, content)\n\
         3. Choose the MOST APPROPRIATE category from the list above\n\
         4. Only use 'unknown' if the document truly doesn't match any category\n\
         5. Provide confidence level (0.0 to 1.0)\n\
         6. If unsure between categories, pick the most likely one with moderate confidence\n\
         \n\
         IMPORTANT: Avoid 'unknown' classification unless absolutely necessary. \
         Even partial matches should be classified with lower confidence.\n\
         \n\
         RESPONSE FORMAT (JSON only):\n\
         {{\n\
             \"classification\": \"category_name\",\n\
             \"confidence\": 0.95,\n\
             \"reasoning\": \"one short sentence\"\n\
         }}\n",
        request.allowed_categories.join(", ")
    ));

    prompt
}

/// Note appended for providers that cannot see the page image.
pub fn text_only_note() -> &'static str {
    "\n\nNote: Image analysis not available with this model. \
     Classification based on text content only."
}

fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
