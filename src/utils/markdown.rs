/// Strips markdown heading markers (`#` runs at the start of a line) from
/// raw webhook text. The rest of the payload is stored verbatim; parsing
/// into structured questions happens later in the operator editor.
pub fn strip_heading_markers(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let trimmed = line.trim_start();
        let hashes = trimmed.chars().take_while(|c| *c == '#').count();
        if hashes > 0 && trimmed[hashes..].starts_with(' ') {
            out.push_str(trimmed[hashes..].trim_start());
        } else if hashes > 0 && trimmed[hashes..].is_empty() {
            // A bare "#" line becomes empty.
        } else {
            out.push_str(line);
        }
    }
    if input.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_heading_runs() {
        let input = "# Title\n## Sub\nbody text";
        assert_eq!(strip_heading_markers(input), "Title\nSub\nbody text");
    }

    #[test]
    fn leaves_inline_hashes_alone() {
        let input = "question #4 is hard\nc# is a language";
        assert_eq!(strip_heading_markers(input), input);
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        assert_eq!(strip_heading_markers("#hashtag"), "#hashtag");
    }

    #[test]
    fn bare_hash_line_becomes_empty() {
        assert_eq!(strip_heading_markers("#\ntext"), "\ntext");
    }
}
