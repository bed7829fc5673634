/// Split a tunebook into individual tunes.
///
/// Every line starting with `X:` begins a new tune; anything before the first `X:`
/// (file headers, free text) is dropped. Text without any `X:` line is one tune.
pub fn split_tunebook(text: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.starts_with("X:") {
            starts.push(offset);
        }
        offset += line.len();
    }

    if starts.is_empty() {
        return if text.trim().is_empty() { Vec::new() } else { vec![text] };
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}
