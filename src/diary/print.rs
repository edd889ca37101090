use chrono::{DateTime, Utc};
use colored::Colorize;
use diary::api::{CmdMessage, MessageLevel};
use diary::config::{DiaryConfig, KEYS};
use diary::grouper::DisplayZone;
use diary::model::Entry;
use diary::view_model::VisibleWindow;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const IMAGE_MARKER: &str = "▣";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => eprintln!("{}", message.content.yellow()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_window(window: &VisibleWindow, zone: &DisplayZone) {
    for (i, bucket) in window.buckets.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!(
            "{}  {}",
            bucket.day.label().bold().blue(),
            bucket.day.to_string().dimmed()
        );
        for entry in &bucket.entries {
            println!("{}", entry_line(entry, zone));
        }
    }

    if window.has_more {
        println!(
            "\n{}",
            format!(
                "{} of {} days shown, continue with --offset {}",
                window.next_offset(),
                window.total,
                window.next_offset()
            )
            .dimmed()
        );
    }
}

fn entry_line(entry: &Entry, zone: &DisplayZone) -> String {
    let id = format!("  {} ", entry.id.short());
    let time = format!("{} ", zone.format(&entry.created_at, "%H:%M"));
    let marker = if entry.image_ref.is_some() {
        format!("{} ", IMAGE_MARKER)
    } else {
        "  ".to_string()
    };
    let time_ago = format_time_ago(entry.created_at);

    let fixed_width = id.width() + time.width() + marker.width() + TIME_WIDTH;
    let available = LINE_WIDTH.saturating_sub(fixed_width);
    let preview = truncate_to_width(&preview_text(&entry.content), available);
    let padding = available.saturating_sub(preview.width());

    format!(
        "{}{}{}{}{}{}",
        id.yellow(),
        time.dimmed(),
        preview,
        " ".repeat(padding),
        marker,
        time_ago.dimmed()
    )
}

pub(super) fn print_full_entries(entries: &[Entry], zone: &DisplayZone) {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            println!("\n================================\n");
        }
        println!(
            "{} {}",
            entry.id.to_string().yellow(),
            zone.format(&entry.created_at, "%a %b %d %Y %H:%M").bold()
        );
        if let Some(image) = &entry.image_ref {
            println!("{} {}", IMAGE_MARKER, image.dimmed());
        }
        println!("--------------------------------");
        println!("{}", entry.content);
    }
}

pub(super) fn print_config(config: &DiaryConfig) {
    for key in KEYS {
        if let Some(value) = config.get(key) {
            println!("{} = {}", key, value);
        }
    }
}

/// Single-line plain text of a rich-text entry.
fn preview_text(content: &str) -> String {
    let mut text = String::with_capacity(content.len());
    let mut in_tag = false;
    for c in content.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '\n' | '\r' | '\t' => text.push(' '),
            _ => text.push(c),
        }
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let time_str = Formatter::new().convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_strips_markup() {
        assert_eq!(
            preview_text("<p>Hello <b>world</b></p>\n<p>again &amp; again</p>"),
            "Hello world again & again"
        );
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        let wide = truncate_to_width("日本語のテキスト", 7);
        assert!(wide.width() <= 7);
        assert!(wide.ends_with('…'));
    }

    #[test]
    fn time_ago_is_right_aligned() {
        let s = format_time_ago(Utc::now());
        assert_eq!(s.width(), TIME_WIDTH.max(s.trim().width()));
    }
}
