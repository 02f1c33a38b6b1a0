//! Recursive text chunking for bounded-size model calls.
//!
//! Long transcripts must be cut into pieces small enough for a single
//! completion request. The splitter prefers the largest semantic boundary
//! available: paragraph breaks first, then line breaks, sentence ends,
//! whitespace, and only as a last resort a hard character cut.

/// Character-per-token approximation used to convert a token budget into a
/// character budget. One token is roughly four characters of English text;
/// the chunker works on characters so callers that think in tokens multiply
/// by this constant. Deliberately a heuristic, not a tokenizer call.
pub const CHARS_PER_TOKEN: usize = 4;

/// Separator cascade, coarsest first. The empty string means a hard cut.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// A bounded-length contiguous piece of a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text.
    pub content: String,
    /// Ordinal index within the source text. Order-preserving.
    pub position: usize,
}

/// Split `text` into ordered chunks of at most `max_chars` characters each.
///
/// A chunk may exceed the bound only when a single atomic piece (one with no
/// finer separator left) cannot be split further without a hard cut at the
/// character level, which never happens since the cascade ends with one.
/// Empty input yields an empty vec; input within the bound yields exactly one
/// chunk equal to the whole text.
#[must_use]
pub fn split_text(text: &str, max_chars: usize) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    split_recursive(text, max_chars, &SEPARATORS)
        .into_iter()
        .enumerate()
        .map(|(position, content)| Chunk { content, position })
        .collect()
}

fn split_recursive(text: &str, max_chars: usize, separators: &[&str]) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let Some((sep, rest)) = separators.split_first() else {
        return vec![text.to_string()];
    };

    if sep.is_empty() {
        return hard_split(text, max_chars);
    }

    if !text.contains(sep) {
        // This separator never occurs; fall through to the next finer one.
        return split_recursive(text, max_chars, rest);
    }

    let pieces: Vec<&str> = text.split(sep).collect();
    merge_pieces(&pieces, sep, max_chars, rest)
}

/// Greedily merge adjacent pieces back together (separator re-inserted) while
/// the combined length stays within the bound. Oversized pieces recurse with
/// the finer separators.
fn merge_pieces(
    pieces: &[&str],
    sep: &str,
    max_chars: usize,
    rest: &[&str],
) -> Vec<String> {
    let sep_len = sep.chars().count();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    let mut flush = |current: &mut String, current_len: &mut usize, chunks: &mut Vec<String>| {
        if !current.is_empty() {
            chunks.push(std::mem::take(current));
            *current_len = 0;
        }
    };

    for piece in pieces {
        let piece_len = piece.chars().count();

        if piece_len > max_chars {
            flush(&mut current, &mut current_len, &mut chunks);
            chunks.extend(split_recursive(piece, max_chars, rest));
            continue;
        }

        let added = if current.is_empty() {
            piece_len
        } else {
            current_len + sep_len + piece_len
        };

        if added > max_chars {
            flush(&mut current, &mut current_len, &mut chunks);
            current.push_str(piece);
            current_len = piece_len;
        } else {
            if !current.is_empty() {
                current.push_str(sep);
            }
            current.push_str(piece);
            current_len = added;
        }
    }

    flush(&mut current, &mut current_len, &mut chunks);

    // split() yields empty strings around leading/trailing separators; drop
    // any all-empty chunk that survived merging.
    chunks.retain(|c| !c.is_empty());
    chunks
}

/// Cut at exact character boundaries. Last resort.
fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|c| c.iter().collect())
        .collect()
}
