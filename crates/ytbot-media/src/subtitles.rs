//! Caption grouping and SRT files.

use std::path::Path;

use ytbot_models::timestamp::{format_srt_timestamp, parse_timestamp};
use ytbot_models::CaptionCue;

use crate::error::{MediaError, MediaResult};

/// A single spoken word with its timing.
#[derive(Debug, Clone, PartialEq)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }
}

/// Group timed words into cues of at most `max_words` words.
pub fn group_words(words: &[WordTiming], max_words: usize) -> Vec<CaptionCue> {
    let max_words = max_words.max(1);
    words
        .iter()
        .filter(|w| !w.word.trim().is_empty())
        .collect::<Vec<_>>()
        .chunks(max_words)
        .filter_map(|chunk| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            let text = chunk
                .iter()
                .map(|w| w.word.trim())
                .collect::<Vec<_>>()
                .join(" ");
            Some(CaptionCue::new(first.start, last.end, text))
        })
        .filter(CaptionCue::is_valid)
        .collect()
}

/// Split an untimed segment into groups of `max_words`, dividing its time
/// across groups by character count.
pub fn split_segment(text: &str, start: f64, end: f64, max_words: usize) -> Vec<CaptionCue> {
    let max_words = max_words.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || end <= start {
        return Vec::new();
    }

    let groups: Vec<String> = words.chunks(max_words).map(|c| c.join(" ")).collect();
    let total_chars: usize = groups.iter().map(|g| g.chars().count()).sum();
    let span = end - start;

    let mut cues = Vec::with_capacity(groups.len());
    let mut cursor = start;
    let mut consumed = 0usize;
    for (i, group) in groups.iter().enumerate() {
        consumed += group.chars().count();
        // The last group ends exactly on the segment end
        let group_end = if i + 1 == groups.len() {
            end
        } else {
            start + span * consumed as f64 / total_chars.max(1) as f64
        };
        cues.push(CaptionCue::new(cursor, group_end, group.clone()));
        cursor = group_end;
    }

    cues.into_iter().filter(CaptionCue::is_valid).collect()
}

/// Render cues as SRT text.
pub fn to_srt(cues: &[CaptionCue]) -> String {
    cues.iter()
        .filter(|c| c.is_valid())
        .enumerate()
        .map(|(i, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                format_srt_timestamp(cue.start),
                format_srt_timestamp(cue.end),
                cue.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse SRT text. Malformed blocks are skipped.
pub fn parse_srt(content: &str) -> Vec<CaptionCue> {
    let normalized = content.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in normalized.split("\n\n") {
        let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());

        let mut line = match lines.next() {
            Some(l) => l,
            None => continue,
        };
        // The index line is optional in practice
        if !line.contains("-->") {
            line = match lines.next() {
                Some(l) => l,
                None => continue,
            };
        }

        let Some((start, end)) = line.split_once("-->") else {
            continue;
        };
        let (Ok(start), Ok(end)) = (parse_timestamp(start.trim()), parse_timestamp(end.trim()))
        else {
            continue;
        };

        let text = lines.collect::<Vec<_>>().join(" ");
        let cue = CaptionCue::new(start, end, text);
        if cue.is_valid() {
            cues.push(cue);
        }
    }

    cues
}

/// Write cues to an SRT file.
pub async fn write_srt_file(path: &Path, cues: &[CaptionCue]) -> MediaResult<()> {
    if cues.iter().all(|c| !c.is_valid()) {
        return Err(MediaError::invalid_input("no renderable captions"));
    }
    tokio::fs::write(path, to_srt(cues)).await?;
    Ok(())
}

/// Read cues back from an SRT file.
pub async fn read_srt_file(path: &Path) -> MediaResult<Vec<CaptionCue>> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_srt(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn words(spec: &[(&str, f64, f64)]) -> Vec<WordTiming> {
        spec.iter()
            .map(|(w, s, e)| WordTiming::new(*w, *s, *e))
            .collect()
    }

    #[test]
    fn test_group_words_by_three() {
        let input = words(&[
            (" The", 0.0, 0.2),
            (" quick", 0.2, 0.5),
            (" brown", 0.5, 0.8),
            (" fox", 0.8, 1.1),
            (" jumps", 1.1, 1.6),
        ]);
        let cues = group_words(&input, 3);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "The quick brown");
        assert_eq!(cues[0].start, 0.0);
        assert_eq!(cues[0].end, 0.8);
        assert_eq!(cues[1].text, "fox jumps");
        assert_eq!(cues[1].end, 1.6);
    }

    #[test]
    fn test_split_segment_proportional() {
        let cues = split_segment("aaaa bbbb cccc dddd", 10.0, 14.0, 2);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "aaaa bbbb");
        assert!((cues[0].end - 12.0).abs() < 1e-9);
        assert_eq!(cues[1].start, cues[0].end);
        assert_eq!(cues[1].end, 14.0);
    }

    #[test]
    fn test_split_segment_degenerate() {
        assert!(split_segment("", 0.0, 1.0, 3).is_empty());
        assert!(split_segment("hello", 2.0, 2.0, 3).is_empty());
    }

    #[test]
    fn test_to_srt_skips_invalid_and_reindexes() {
        let cues = vec![
            CaptionCue::new(0.0, 1.5, "first"),
            CaptionCue::new(2.0, 2.0, "empty span"),
            CaptionCue::new(61.25, 62.0, "second"),
        ];
        let srt = to_srt(&cues);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,500\nfirst\n\n2\n00:01:01,250 --> 00:01:02,000\nsecond\n"
        );
    }

    #[test]
    fn test_parse_srt() {
        let content = "1\r\n00:00:01,000 --> 00:00:02,500\r\nHello\r\nworld\r\n\r\n\
                       2\r\n00:00:03,000 --> 00:00:02,000\r\nbackwards\r\n\r\n\
                       garbage block\r\n";
        let cues = parse_srt(content);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Hello world");
        assert!((cues[0].end - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_srt_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("captions.srt");
        let cues = vec![
            CaptionCue::new(0.0, 0.9, "one two three"),
            CaptionCue::new(0.9, 1.7, "four"),
        ];
        write_srt_file(&path, &cues).await.unwrap();
        assert_eq!(read_srt_file(&path).await.unwrap(), cues);
    }

    #[tokio::test]
    async fn test_write_without_captions_fails() {
        let dir = TempDir::new().unwrap();
        let result = write_srt_file(&dir.path().join("x.srt"), &[]).await;
        assert!(matches!(result, Err(MediaError::InvalidInput(_))));
    }
}
