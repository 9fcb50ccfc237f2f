use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;

use precis_core::{Reduction, SummaryReport, TextStats};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}%"),
        None => "n/a".to_string(),
    }
}

fn heading(w: &mut dyn Write, text: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", text.bold())
    } else {
        writeln!(w, "{}", text)
    }
}

/// Print a summary report: the summary, counts on both sides and keywords.
pub fn print_report(w: &mut dyn Write, report: &SummaryReport, color: ColorMode) -> std::io::Result<()> {
    heading(w, "Summary", color)?;
    writeln!(w, "{}", report.summary)?;
    writeln!(w)?;

    let reduction = report.reduction();
    writeln!(
        w,
        "Original:   {} sentences, {} words",
        report.original_sentences, report.original_words
    )?;
    writeln!(
        w,
        "Summarized: {} sentences, {} words",
        report.summarized_sentences, report.summarized_words
    )?;
    print_reduction(w, &reduction, color)?;

    if !report.keywords.is_empty() {
        let joined = report.keywords.join(", ");
        if color.enabled() {
            writeln!(w, "Keywords:   {}", joined.cyan())?;
        } else {
            writeln!(w, "Keywords:   {}", joined)?;
        }
    }
    Ok(())
}

fn print_reduction(w: &mut dyn Write, reduction: &Reduction, color: ColorMode) -> std::io::Result<()> {
    let line = format!(
        "Reduction:  {} of words, {} of sentences",
        percent(reduction.reduction_word),
        percent(reduction.reduction_sentence)
    );
    if color.enabled() {
        writeln!(w, "{}", line.green())
    } else {
        writeln!(w, "{}", line)
    }
}

/// Print extracted text followed by its counts.
pub fn print_extraction(
    w: &mut dyn Write,
    path: &Path,
    text: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    let stats = TextStats::of(text);
    heading(w, &format!("Text of {}", path.display()), color)?;
    writeln!(w, "{}", text.trim_end())?;
    writeln!(w)?;
    let counts = format!("{} sentences, {} words", stats.sentences, stats.words);
    if color.enabled() {
        writeln!(w, "{}", counts.dimmed())
    } else {
        writeln!(w, "{}", counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SummaryReport {
        SummaryReport {
            summary: "Owls hunt at night.".to_string(),
            original_sentences: 4,
            original_words: 40,
            summarized_sentences: 1,
            summarized_words: 4,
            keywords: vec!["Owls".to_string(), "hunt".to_string()],
        }
    }

    #[test]
    fn plain_report() {
        let mut out = Vec::new();
        print_report(&mut out, &report(), ColorMode(false)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Summary\nOwls hunt at night.\n"));
        assert!(text.contains("Original:   4 sentences, 40 words"));
        assert!(text.contains("Reduction:  90.0% of words, 75.0% of sentences"));
        assert!(text.contains("Keywords:   Owls, hunt"));
    }

    #[test]
    fn undefined_reduction_is_not_a_number() {
        let empty = SummaryReport {
            summary: String::new(),
            original_sentences: 0,
            original_words: 0,
            summarized_sentences: 0,
            summarized_words: 0,
            keywords: Vec::new(),
        };
        let mut out = Vec::new();
        print_report(&mut out, &empty, ColorMode(false)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Reduction:  n/a of words, n/a of sentences"));
        assert!(!text.contains("Keywords"));
    }

    #[test]
    fn extraction_with_counts() {
        let mut out = Vec::new();
        print_extraction(
            &mut out,
            Path::new("notes.txt"),
            "One sentence. Two words!\n\n",
            ColorMode(false),
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Text of notes.txt\nOne sentence. Two words!\n\n2 sentences, 4 words\n"
        );
    }
}
