//! Presentation of documents and gap reports.
//!
//! Pure views over session state: a print-ready HTML page for a CV and plain
//! text for the terminal.

use crate::document::DocumentModel;
use crate::models::{GapReport, Theme};
use crate::session::GapView;
use html_escape::encode_text;
use std::fmt::Write;

/// Colours and typeface for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub background: &'static str,
    pub accent: &'static str,
    pub heading: &'static str,
    pub text: &'static str,
    pub badge: &'static str,
    pub font_family: &'static str,
}

const MONO: &str = "'JetBrains Mono', 'Fira Code', Menlo, monospace";
const SANS: &str = "Inter, 'Helvetica Neue', Arial, sans-serif";
const SERIF: &str = "Georgia, 'Times New Roman', serif";

pub fn palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Tech => ThemePalette {
            background: "#0a0f1a",
            accent: "#22d3ee",
            heading: "#ffffff",
            text: "#cbd5e1",
            badge: "#083344",
            font_family: MONO,
        },
        Theme::Corporate => ThemePalette {
            background: "#ffffff",
            accent: "#1d4ed8",
            heading: "#0f172a",
            text: "#475569",
            badge: "#eff6ff",
            font_family: SANS,
        },
        Theme::Creative => ThemePalette {
            background: "#fafafa",
            accent: "#f43f5e",
            heading: "#0f172a",
            text: "#334155",
            badge: "#fff1f2",
            font_family: SERIF,
        },
        Theme::Medical => ThemePalette {
            background: "#f0f9ff",
            accent: "#047857",
            heading: "#1e293b",
            text: "#475569",
            badge: "#ffffff",
            font_family: SANS,
        },
        Theme::Finance => ThemePalette {
            background: "#020617",
            accent: "#f59e0b",
            heading: "#ffffff",
            text: "#94a3b8",
            badge: "#451a03",
            font_family: SERIF,
        },
    }
}

/// Standalone A4 page with every editable field flattened to static text.
pub fn print_html(document: &DocumentModel, headline: &str) -> String {
    let colors = palette(document.theme());
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
@page {{ size: A4; margin: 1cm; }}
* {{ box-sizing: border-box; }}
body {{ margin: 0; background: {bg}; color: {text}; font-family: {font}; }}
main {{ padding: 2.5rem; }}
header {{ display: flex; justify-content: space-between; gap: 2rem; border-bottom: 2px solid {accent}; padding-bottom: 1.5rem; margin-bottom: 2rem; }}
h1 {{ margin: 0; font-size: 2.6rem; letter-spacing: -0.03em; color: {heading}; }}
.headline {{ margin: 0.5rem 0 0; text-transform: uppercase; letter-spacing: 0.2em; font-weight: 700; color: {accent}; }}
.contact {{ list-style: none; margin: 0; padding: 0; font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.2em; }}
.columns {{ display: grid; grid-template-columns: 2fr 1fr; gap: 2.5rem; }}
h2 {{ font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.5em; color: {accent}; border-left: 4px solid {accent}; padding-left: 0.75rem; }}
section p {{ white-space: pre-wrap; line-height: 1.6; }}
.skills span {{ display: inline-block; margin: 0 0.4rem 0.4rem 0; padding: 0.35rem 0.8rem; border: 1px solid {accent}; border-radius: 0.6rem; background: {badge}; color: {accent}; font-size: 0.65rem; font-weight: 800; text-transform: uppercase; }}
section {{ break-inside: avoid; }}
</style>
</head>
<body>
<main>
<header>
<div>
<h1>{name}</h1>
<p class="headline">{headline}</p>
</div>
<ul class="contact">
"#,
        title = encode_text(document.user_name()),
        bg = colors.background,
        text = colors.text,
        font = colors.font_family,
        accent = colors.accent,
        heading = colors.heading,
        badge = colors.badge,
        name = encode_text(document.user_name()),
        headline = encode_text(headline),
    );

    for value in document.contact_fields().values() {
        let _ = writeln!(html, "<li>{}</li>", encode_text(value));
    }
    let _ = writeln!(html, "<li>{}</li>", encode_text(document.user_location()));
    html.push_str("</ul>\n</header>\n<div class=\"columns\">\n<div>\n");

    for section in document.sections() {
        let _ = writeln!(
            html,
            "<section>\n<h2>{}</h2>\n<p>{}</p>\n</section>",
            encode_text(&section.title),
            encode_text(&section.text)
        );
    }

    html.push_str("</div>\n<aside>\n<h2>Skills</h2>\n<div class=\"skills\">\n");
    for skill in document.skills() {
        let _ = writeln!(html, "<span>{}</span>", encode_text(skill));
    }
    html.push_str("</div>\n</aside>\n</div>\n</main>\n</body>\n</html>\n");

    html
}

pub fn draft_summary_text(document: &DocumentModel, headline: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", document.user_name());
    let _ = writeln!(out, "{}", headline);
    let _ = writeln!(out, "Theme: {}", document.theme());
    let _ = writeln!(out);

    for section in document.sections() {
        let marker = if document.is_refining(&section.title) {
            " (refining)"
        } else {
            ""
        };
        let _ = writeln!(out, "## {}{}", section.title, marker);
        let _ = writeln!(out, "{}", section.text);
        let _ = writeln!(out);
    }

    if !document.skills().is_empty() {
        let _ = writeln!(out, "Skills: {}", document.skills().join(", "));
    }
    out
}

pub fn gap_report_text(report: &GapReport, view: &GapView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Gap Remediation Plan");
    let _ = writeln!(out);

    for (index, gap) in report.gaps.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, gap.skill);
        for course in view.visible_courses(report, index) {
            let _ = writeln!(
                out,
                "   - [{}] {} <{}>",
                course.platform, course.course_name, course.url
            );
        }
        let hidden = gap.courses.len() - view.visible_courses(report, index).len();
        if hidden > 0 {
            let _ = writeln!(out, "   (+{} more)", hidden);
        }
    }

    if !report.grounding_sources.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Sources:");
        for source in &report.grounding_sources {
            let _ = writeln!(out, " - {} <{}>", source.title, source.uri);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, GeneratedDraft, GroundingSource, SectionDraft, SkillGap};

    fn document() -> DocumentModel {
        let mut document = DocumentModel::from_draft(&GeneratedDraft {
            skills: vec!["C++".to_string(), "R&D".to_string()],
            sections: vec![
                SectionDraft {
                    title: "Summary".to_string(),
                    content: "Ships <fast> & safe".to_string(),
                },
                SectionDraft {
                    title: "Experience".to_string(),
                    content: "Line one\nLine two".to_string(),
                },
            ],
            theme: Theme::Corporate,
            niche_summary: "Systems Engineer".to_string(),
        });
        document.set_user_name("Linus O'Brien");
        document
    }

    fn report() -> GapReport {
        let course = |n: usize| Course {
            course_name: format!("Course {}", n),
            platform: "Udemy".to_string(),
            url: format!("https://example.com/{}", n),
        };
        GapReport {
            gaps: vec![
                SkillGap {
                    skill: "Rust".to_string(),
                    courses: vec![course(1), course(2), course(3)],
                },
                SkillGap {
                    skill: "Go".to_string(),
                    courses: vec![course(4), course(5), course(6)],
                },
            ],
            grounding_sources: vec![GroundingSource {
                title: "Udemy".to_string(),
                uri: "https://udemy.com".to_string(),
            }],
        }
    }

    #[test]
    fn test_every_theme_has_a_palette() {
        for theme in Theme::ALL {
            let colors = palette(theme);
            assert!(colors.background.starts_with('#'));
            assert!(colors.accent.starts_with('#'));
            assert!(!colors.font_family.is_empty());
        }
        assert_ne!(palette(Theme::Tech), palette(Theme::Finance));
    }

    #[test]
    fn test_print_html_is_static_and_escaped() {
        let html = print_html(&document(), "Systems Engineer");

        assert!(html.contains("@page { size: A4; margin: 1cm; }"));
        assert!(!html.contains("<input"));
        assert!(!html.contains("<textarea"));
        assert!(!html.contains("<button"));
        assert!(html.contains("<h1>LINUS O'BRIEN</h1>"));
        assert!(html.contains("Ships &lt;fast&gt; &amp; safe"));
        assert!(html.contains("<span>R&amp;D</span>"));
        assert!(html.contains("CONTACT@DOMAIN.COM"));
        assert!(html.contains("City, Country"));
        assert!(html.contains(palette(Theme::Corporate).accent));
    }

    #[test]
    fn test_print_html_neutralises_markup_in_user_text() {
        let mut document = document();
        document.set_user_location("<script>alert(1)</script>");
        document.set_contact_field(crate::document::EMAIL_FIELD, "a&b@example.com");

        let html = print_html(&document, "<b>Lead</b>");

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&lt;b&gt;Lead&lt;/b&gt;"));
        assert!(html.contains("<li>a&amp;b@example.com</li>"));
    }

    #[test]
    fn test_print_html_keeps_section_order() {
        let html = print_html(&document(), "Systems Engineer");
        let summary = html.find("<h2>Summary</h2>").unwrap();
        let experience = html.find("<h2>Experience</h2>").unwrap();
        assert!(summary < experience);
    }

    #[test]
    fn test_print_html_follows_selected_theme() {
        let mut document = document();
        document.set_theme(Theme::Tech);
        let html = print_html(&document, "x");
        assert!(html.contains(palette(Theme::Tech).background));
    }

    #[test]
    fn test_gap_report_text_respects_expansion() {
        let report = report();
        let mut view = GapView::new(report.gaps.len());
        view.toggle(1);

        let text = gap_report_text(&report, &view);

        assert!(text.contains("1. Rust"));
        assert!(text.contains("Course 1"));
        assert!(!text.contains("Course 2"));
        assert!(text.contains("(+2 more)"));
        assert!(text.contains("Course 4"));
        assert!(text.contains("Course 6"));
        assert!(text.contains("Sources:"));
        assert!(text.contains("https://udemy.com"));
    }

    #[test]
    fn test_draft_summary_marks_refining_sections() {
        let mut document = document();
        document.begin_refinement("Experience").unwrap();

        let text = draft_summary_text(&document, "Systems Engineer");

        assert!(text.contains("## Summary\n"));
        assert!(text.contains("## Experience (refining)"));
        assert!(text.contains("Skills: C++, R&D"));
    }
}
