//! Text cleaning, sentence splitting and overlap extraction.

use crate::tokenizer::Tokenizer;

/// Punctuation kept by [`clean_text`]; everything else that is not a word
/// character or whitespace becomes a space.
const KEPT_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '-', '(', ')', '[', ']', '"', '\''];

fn is_kept(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || KEPT_PUNCTUATION.contains(&c)
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Is this line a bare page number?
fn is_page_number(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && t.chars().all(|c| c.is_ascii_digit())
}

/// Normalize extracted text: drop bare page-number lines, replace characters
/// outside the allow-list with spaces, and collapse all whitespace runs to a
/// single space. The result is trimmed.
pub fn clean_text(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    for line in text.lines().filter(|l| !is_page_number(l)) {
        kept.extend(line.chars().map(|c| if is_kept(c) { c } else { ' ' }));
        kept.push('\n');
    }
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text after every run of `.`, `!` or `?`. The terminating run stays
/// with its sentence, so joining the result with single spaces gives back
/// cleaned input. Whitespace-only fragments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminal(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        push_fragment(&mut sentences, &text[start..end]);
        start = end;
    }

    push_fragment(&mut sentences, &text[start..]);
    sentences
}

fn push_fragment(out: &mut Vec<String>, fragment: &str) {
    let s = fragment.trim();
    if !s.is_empty() {
        out.push(s.to_string());
    }
}

/// The text of the last `overlap` tokens of `text`.
///
/// Returns all of `text` when it has no more than `overlap` tokens, and an
/// empty string when `overlap` is zero. A BPE slice can begin in the middle
/// of a multi-byte character; the start moves forward one token at a time
/// until the tail decodes.
pub(crate) fn overlap_tail(tokenizer: &dyn Tokenizer, text: &str, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }
    let tokens = tokenizer.encode(text);
    if tokens.len() <= overlap {
        return text.trim().to_string();
    }

    let mut start = tokens.len() - overlap;
    while start < tokens.len() {
        match tokenizer.decode(&tokens[start..]) {
            Ok(tail) => return tail.trim().to_string(),
            Err(_) => start += 1,
        }
    }
    String::new()
}
