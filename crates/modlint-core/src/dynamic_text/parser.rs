//! Segment splitter for dynamic text
//!
//! A tag runs from a `<` to the first `>` after it. A `<` inside a tag is
//! kept as tag text (the validator warns about it), and a `<` with no `>`
//! after it is plain text.

use super::{Segment, Tag, TagArgument};

/// Split a value into text and tag segments
pub fn parse_segments(value: &str) -> Vec<Segment> {
    let chars: Vec<char> = value.chars().collect();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < chars.len() {
        if chars[pos] != '<' {
            pos += 1;
            continue;
        }
        let Some(close) = chars[pos + 1..].iter().position(|&c| c == '>').map(|i| pos + 1 + i) else {
            break;
        };

        push_text(&mut segments, &chars, text_start, pos);
        segments.push(Segment::Tag(parse_tag(&chars, pos, close)));
        pos = close + 1;
        text_start = pos;
    }

    push_text(&mut segments, &chars, text_start, chars.len());
    segments
}

fn push_text(segments: &mut Vec<Segment>, chars: &[char], start: usize, end: usize) {
    if start < end {
        segments.push(Segment::Text {
            text: chars[start..end].iter().collect(),
            range: start..end,
        });
    }
}

/// `open` is the index of `<`, `close` the index of `>`
fn parse_tag(chars: &[char], open: usize, close: usize) -> Tag {
    let mut parts = Vec::new();
    let mut part_start = open + 1;
    for (i, &c) in chars.iter().enumerate().take(close).skip(open + 1) {
        if c == '=' {
            parts.push(part_start..i);
            part_start = i + 1;
        }
    }
    parts.push(part_start..close);

    let mut parts = parts.into_iter();
    let raw_name = parts.next().unwrap_or(open + 1..close);
    let name_chars = &chars[raw_name.clone()];
    let leading = name_chars.iter().take_while(|c| c.is_whitespace()).count();
    let trailing = name_chars[leading..]
        .iter()
        .rev()
        .take_while(|c| c.is_whitespace())
        .count();
    let name_range = (raw_name.start + leading)..(raw_name.end - trailing);

    Tag {
        name: chars[name_range.clone()].iter().collect(),
        name_range,
        args: parts
            .map(|range| TagArgument {
                text: chars[range.clone()].iter().collect(),
                range,
            })
            .collect(),
        range: open..close + 1,
        source: chars[open..=close].iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(value: &str) -> Vec<Tag> {
        parse_segments(value)
            .into_iter()
            .filter_map(|s| match s {
                Segment::Tag(tag) => Some(tag),
                Segment::Text { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_tag_with_trailing_empty_argument() {
        let tags = tags("<color=red=>");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "color");
        let args: Vec<_> = tags[0].args.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(args, vec!["red", ""]);
        assert_eq!(tags[0].args[1].range, 11..11);
    }

    #[test]
    fn test_segments_reconstruct_value() {
        for value in [
            "Deals <value=abs:5> damage to <c=red>foes</c>",
            "no tags here",
            "a < b and c > d",
            "unterminated <color=red",
            "<>",
            "",
        ] {
            let rebuilt: String = parse_segments(value).iter().map(Segment::source).collect();
            assert_eq!(rebuilt, value);
        }
    }

    #[test]
    fn test_name_is_trimmed_with_position() {
        let tags = tags("x< color =red>");
        assert_eq!(tags[0].name, "color");
        assert_eq!(tags[0].name_range, 3..8);
        assert_eq!(tags[0].range, 1..14);
    }

    #[test]
    fn test_unterminated_tag_is_text() {
        let segments = parse_segments("hello <world");
        assert_eq!(
            segments,
            vec![Segment::Text {
                text: "hello <world".into(),
                range: 0..12,
            }]
        );
    }

    #[test]
    fn test_nested_open_bracket_stays_inside_tag() {
        let tags = tags("<color=<b>>");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].args[0].text, "<b");
    }

    #[test]
    fn test_offsets_are_characters() {
        let tags = tags("é<c=red>");
        assert_eq!(tags[0].range, 1..8);
        assert_eq!(tags[0].args[0].range, 4..7);
    }
}
