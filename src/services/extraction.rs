//! Report extraction service: one rendered build report page in, one
//! `BuildReport` out.
//!
//! The report format is a rendered human page, not a stable schema, so
//! extraction is template matching: recognize characteristic section labels
//! ("New test failures", "Existing test failures", "Fixed tests", the totals
//! line), extract repeating failure blocks within each recognized section,
//! and degrade gracefully to a partial model when sections are missing.
//! Parsing is a pure function of the document text; no shared state.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    AsanFinding, BuildReport, BuildStatus, FailedJob, JobRef, TestFailure,
};

// ============================================================================
// Templates
// ============================================================================

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script.*?</script>").unwrap());
static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<style.*?</style>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").unwrap());
static BUILD_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([\d,]+)").unwrap());
static FAILED_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bfailed\b").unwrap());
static SUCCESS_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(successful|success)\b").unwrap());

static COMPLETED_DT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<dt[^>]*class="[^"]*completed[^"]*"[^>]*>"#).unwrap());
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<time([^>]*)>(.*?)</time>").unwrap());
static DATETIME_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"datetime="([^"]+)""#).unwrap());
static AGO_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*–\s*.*$").unwrap());

static TOTAL_TESTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Total tests[:\s]+([\d,]+)").unwrap());
static QUARANTINED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d,]+)\s+Quarantined\s*/\s*skipped").unwrap());
static SECTION_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(New|Existing) test failures\s+([\d,]+)").unwrap()
});

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table[^>]*>.*?</table>").unwrap());
static ROW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<tr[^>]*>.*?</tr>").unwrap());
static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<t[dh][^>]*>(.*?)</t[dh]>").unwrap());
static TEST_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span[^>]*class="[^"]*test-class[^"]*"[^>]*>(.*?)</span>"#).unwrap()
});
static TEST_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a[^>]*class="[^"]*test-name[^"]*"[^>]*>(.*?)</a>"#).unwrap()
});
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a[^>]*>(.*?)</a>").unwrap());
static COMBINED_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\[([^\]]+)\]").unwrap());
static BLOCK_QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:blockquote|pre)[^>]*>(.*?)</(?:blockquote|pre)>").unwrap()
});
static JOB_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<h[2-4][^>]*class="[^"]*job[^"]*"[^>]*>(.*?)</h[2-4]>"#).unwrap()
});

static JOB_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<li[^>]*\bid="job-[^"]*"[^>]*>"#).unwrap());
static CLASS_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="([^"]*)""#).unwrap());
static TITLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"title="([^"]*)""#).unwrap());
static JOB_KEY_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-job-key="([^"]*)""#).unwrap());

static HUNG_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)hung|timed?[\s-]?out").unwrap());
static ASAN_JOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)AddressSanitizer|ASAN").unwrap());
static ASAN_ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Address Sanitizer Error detected in (\S+)").unwrap());
static LEAKS_TRIGGERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d,]+)\s+Leaks?\s+triggered").unwrap());
static PATH_TEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9_]+)\.(test_[A-Za-z0-9_]+)").unwrap());
static BARE_TEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(test_[A-Za-z0-9_]+)").unwrap());

/// Phrase Bamboo emits for builds it gave up on after log silence.
const HUNG_BUILD_PHRASE: &str = "Detected hung build state";

const UNKNOWN_JOB: &str = "Unknown Job";

/// Row texts that are headers or controls rather than test identifiers.
const NON_TEST_LABELS: &[&str] = &["test", "status", "view job", "failed", "collapse", "expand"];

/// Keywords marking a detail row as failure diagnostics rather than data.
const ERROR_KEYWORDS: &[&str] = &["Error", "Failure", "Assert", "RFC", "MUST", "Exception"];

// ============================================================================
// Plan kinds
// ============================================================================

/// The kind of plan a report belongs to; selects the test-identifier
/// convention used when a combined suite+name label has to be split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// Protocol-compliance plans with structured ids (`ANVL-LDP-9.5`).
    Compliance,
    /// Topology-test plans with dotted/underscored function names.
    Topotest,
}

impl PlanKind {
    /// Split a combined label into `(suite, test_name)`.
    ///
    /// The bracketed form `Suite [case]` wins for both kinds; the rightmost
    /// bracketed segment is the reusable identifier. Without brackets,
    /// topotest labels of the form `module.test_case` split at the last dot
    /// before a `test_` segment; anything else is a bare identifier.
    pub fn split_combined(&self, label: &str) -> (Option<String>, String) {
        if let Some(caps) = COMBINED_LABEL_RE.captures(label) {
            return (
                Some(caps[1].trim().to_string()),
                caps[2].trim().to_string(),
            );
        }
        if let Self::Topotest = self {
            if let Some(caps) = PATH_TEST_RE.captures(label) {
                return (Some(caps[1].to_string()), caps[2].to_string());
            }
        }
        (None, label.trim().to_string())
    }
}

// ============================================================================
// Extraction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    NewFailures,
    ExistingFailures,
    FixedTests,
}

/// Parse one build report document.
///
/// Fails with `AppError::Parse` only when the document matches no known
/// report template at all (an error page or login page was fetched instead
/// of a report). A partially recognized document yields a best-effort
/// report; missing sections become empty fields, never invented data.
pub fn parse_report(html: &str, build_id: u64, plan_kind: PlanKind) -> AppResult<BuildReport> {
    let page_text = text_content(html);

    let heading = H1_RE
        .captures(html)
        .map(|caps| text_content(&caps[1]));

    let build_id = heading
        .as_deref()
        .and_then(|h| BUILD_NUM_RE.captures(h))
        .and_then(|caps| parse_count(&caps[1]))
        .unwrap_or(build_id);

    let completed_at = parse_completed_at(html);
    let total_tests = TOTAL_TESTS_RE
        .captures(&page_text)
        .and_then(|caps| parse_count(&caps[1]))
        .unwrap_or(0);
    let quarantined_count = QUARANTINED_RE
        .captures(&page_text)
        .and_then(|caps| parse_count(&caps[1]))
        .unwrap_or(0);

    let asan_findings = parse_asan_findings(&page_text);
    let (failed_jobs, hung_jobs) = parse_job_items(html, &page_text, &asan_findings);

    let mut failures = Vec::new();
    let mut fixed_tests = Vec::new();
    let mut saw_test_table = false;

    for table in TABLE_RE.find_iter(html) {
        let Some(kind) = classify_table(html, table.as_str(), table.start()) else {
            continue;
        };
        saw_test_table = true;
        let enclosing_job = nearest_job_heading(html, table.start());
        match kind {
            SectionKind::NewFailures | SectionKind::ExistingFailures => {
                parse_failure_rows(
                    table.as_str(),
                    kind,
                    plan_kind,
                    enclosing_job.as_deref(),
                    &mut failures,
                );
            }
            SectionKind::FixedTests => {
                parse_fixed_rows(table.as_str(), plan_kind, &mut fixed_tests);
            }
        }
    }

    // A document with none of the recognized landmarks is not a report.
    let recognized = heading
        .as_deref()
        .is_some_and(|h| BUILD_NUM_RE.is_match(h))
        || completed_at.is_some()
        || total_tests > 0
        || saw_test_table
        || !failed_jobs.is_empty();
    if !recognized {
        return Err(AppError::Parse(
            "Document does not match any known report template".to_string(),
        ));
    }

    let status = determine_status(
        heading.as_deref(),
        &page_text,
        &failures,
        &failed_jobs,
        total_tests,
    );

    debug!(
        "Parsed build {}: status {}, {} failures, {} failed jobs",
        build_id,
        status,
        failures.len(),
        failed_jobs.len()
    );

    Ok(BuildReport {
        build_id,
        status,
        completed_at,
        total_tests,
        quarantined_count,
        failures,
        fixed_tests,
        failed_jobs,
        hung_jobs,
    })
}

/// Status comes from the most authoritative indicator available, in order:
/// the summary badge in the build heading, the "Failing since" marker, the
/// per-section failure counts, then the parsed failure lists. A build with
/// enumerated failures is never reported as Success.
fn determine_status(
    heading: Option<&str>,
    page_text: &str,
    failures: &[TestFailure],
    failed_jobs: &[FailedJob],
    total_tests: u64,
) -> BuildStatus {
    let mut status = BuildStatus::Unknown;

    if let Some(heading) = heading {
        if FAILED_WORD_RE.is_match(heading) {
            status = BuildStatus::Failed;
        } else if SUCCESS_WORD_RE.is_match(heading) {
            status = BuildStatus::Success;
        }
    }

    if status == BuildStatus::Unknown && page_text.contains("Failing since") {
        status = BuildStatus::Failed;
    }

    if status == BuildStatus::Unknown {
        for caps in SECTION_COUNT_RE.captures_iter(page_text) {
            if parse_count(&caps[2]).unwrap_or(0) > 0 {
                status = BuildStatus::Failed;
                break;
            }
        }
    }

    let has_failures = !failures.is_empty() || !failed_jobs.is_empty();
    if has_failures {
        // Parser invariant: Success implies an empty failure list.
        return BuildStatus::Failed;
    }
    if status == BuildStatus::Unknown && total_tests > 0 {
        status = BuildStatus::Success;
    }
    status
}

/// Largest char boundary at or below `idx`.
fn char_floor(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn parse_completed_at(html: &str) -> Option<DateTime<Utc>> {
    let start = COMPLETED_DT_RE.find(html)?.end();
    let window = &html[start..char_floor(html, start + 2000)];
    let caps = TIME_RE.captures(window)?;

    if let Some(attr) = DATETIME_ATTR_RE.captures(&caps[1]) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&attr[1]) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    // Display text like "17 Oct 2025, 1:43:42 PM – 18 hours ago"
    let shown = text_content(&caps[2]);
    let shown = AGO_SUFFIX_RE.replace(&shown, "");
    let shown = shown.trim();
    match NaiveDateTime::parse_from_str(shown, "%d %b %Y, %I:%M:%S %p") {
        Ok(naive) => Some(naive.and_utc()),
        Err(err) => {
            warn!("Unparsable completion time {:?}: {}", shown, err);
            None
        }
    }
}

/// Classify a table as one of the recognized failure sections, or skip it.
fn classify_table(html: &str, table_html: &str, table_start: usize) -> Option<SectionKind> {
    let header_row = ROW_RE.find(table_html)?;
    let header = text_content(header_row.as_str()).to_lowercase();
    if header.contains("artifact") || header.contains("file size") {
        return None;
    }

    // Section label: table caption first, then the markup just before the
    // table (Bamboo renders the label as a heading above it).
    let lead_start = char_floor(html, table_start.saturating_sub(600));
    let context = format!(
        "{} {}",
        text_content(&html[lead_start..table_start]),
        text_content(&table_html[..char_floor(table_html, 400)])
    )
    .to_lowercase();

    if context.contains("fixed tests") {
        return Some(SectionKind::FixedTests);
    }
    if context.contains("existing test failures") {
        return Some(SectionKind::ExistingFailures);
    }
    if context.contains("new test failures") {
        return Some(SectionKind::NewFailures);
    }

    // Unlabeled test-results table: treated as newly observed failures.
    if header.contains("status") && header.contains("test") {
        return Some(SectionKind::NewFailures);
    }
    None
}

/// Extract failure rows from a test table into `failures`.
///
/// Column layout varies per section (an extra twixie/failing-since column in
/// some), so fields are located by their dedicated markup first and by
/// position only as a fallback.
fn parse_failure_rows(
    table_html: &str,
    kind: SectionKind,
    plan_kind: PlanKind,
    enclosing_job: Option<&str>,
    failures: &mut Vec<TestFailure>,
) {
    let mut last_pushed = false;

    for row in ROW_RE.find_iter(table_html).skip(1) {
        let cells: Vec<&str> = CELL_RE
            .captures_iter(row.as_str())
            .map(|caps| caps.get(1).map(|m| m.as_str()).unwrap_or_default())
            .collect();

        // Detail rows have fewer cells and carry the diagnostics for the
        // failure row just above them.
        if cells.len() <= 2 {
            if last_pushed {
                let text = detail_text(row.as_str());
                if ERROR_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                    if let Some(last) = failures.last_mut() {
                        if last.error_text.is_empty() {
                            last.error_text = text;
                        }
                    }
                }
            }
            last_pushed = false;
            continue;
        }

        // New-failure tables list passing rows too; only keep failing ones.
        if kind == SectionKind::NewFailures {
            let status_text = text_content(cells[0]).to_lowercase();
            let second = cells
                .get(1)
                .map(|c| text_content(c).to_lowercase())
                .unwrap_or_default();
            let is_failure = status_text.contains("fail")
                || status_text.contains("collapse")
                || second.contains("fail");
            if !is_failure {
                last_pushed = false;
                continue;
            }
        }

        let Some((suite, test_name)) = extract_test_identifier(&cells, plan_kind) else {
            last_pushed = false;
            continue;
        };

        let job = extract_job(&cells).or_else(|| enclosing_job.map(str::to_string));
        let job = JobRef::new(job.unwrap_or_else(|| UNKNOWN_JOB.to_string()));

        failures.push(TestFailure {
            test_name,
            suite,
            job,
            error_text: String::new(),
        });
        last_pushed = true;
    }
}

fn parse_fixed_rows(table_html: &str, plan_kind: PlanKind, fixed_tests: &mut Vec<String>) {
    for row in ROW_RE.find_iter(table_html).skip(1) {
        let cells: Vec<&str> = CELL_RE
            .captures_iter(row.as_str())
            .map(|caps| caps.get(1).map(|m| m.as_str()).unwrap_or_default())
            .collect();
        if cells.len() < 2 {
            continue;
        }
        // A collapsed twixie means the row is still failing, not fixed.
        let status_text = text_content(cells[0]).to_lowercase();
        if status_text.contains("collapse") {
            continue;
        }
        if let Some((suite, test_name)) = extract_test_identifier(&cells, plan_kind) {
            fixed_tests.push(match suite {
                Some(suite) => format!("{}.{}", suite, test_name),
                None => test_name,
            });
        }
    }
}

/// Test identifier precedence: dedicated test-name link (plus test-class
/// suite span) first, then a combined `Suite [case]` label.
fn extract_test_identifier(
    cells: &[&str],
    plan_kind: PlanKind,
) -> Option<(Option<String>, String)> {
    let test_cell = cells
        .iter()
        .find(|cell| TEST_NAME_RE.is_match(cell))
        .copied()
        .or_else(|| {
            if cells.len() >= 3 {
                Some(cells[2])
            } else {
                cells.get(1).copied()
            }
        })?;

    let (suite, test_name) = if let Some(name_caps) = TEST_NAME_RE.captures(test_cell) {
        let suite = TEST_CLASS_RE
            .captures(test_cell)
            .map(|caps| text_content(&caps[1]));
        (suite, text_content(&name_caps[1]))
    } else {
        plan_kind.split_combined(&text_content(test_cell))
    };

    if test_name.is_empty() || NON_TEST_LABELS.contains(&test_name.to_lowercase().as_str()) {
        return None;
    }
    Some((suite.filter(|s| !s.is_empty()), test_name))
}

/// Job column position depends on the section's column count: tables with a
/// failing-since column carry the job in column 4, the rest in column 3.
/// Link text wins over raw cell text.
fn extract_job(cells: &[&str]) -> Option<String> {
    let job_col = if cells.len() >= 6 { 4 } else { 3 };
    let cell = cells.get(job_col)?;
    let name = match LINK_RE.captures(cell) {
        Some(caps) => text_content(&caps[1]),
        None => text_content(cell),
    };
    if name.is_empty() { None } else { Some(name) }
}

/// The nearest job heading preceding `pos`, for failures whose block carries
/// no job label of its own.
fn nearest_job_heading(html: &str, pos: usize) -> Option<String> {
    let mut nearest = None;
    for caps in JOB_HEADING_RE.captures_iter(html) {
        let m = caps.get(0).unwrap();
        if m.start() >= pos {
            break;
        }
        let name = text_content(&caps[1]);
        if !name.is_empty() {
            nearest = Some(name);
        }
    }
    nearest
}

// ============================================================================
// Job results
// ============================================================================

/// Extract failed and hung jobs from the per-job result list.
fn parse_job_items(
    html: &str,
    page_text: &str,
    asan_findings: &[AsanFinding],
) -> (Vec<FailedJob>, BTreeSet<JobRef>) {
    let mut failed_jobs: Vec<FailedJob> = Vec::new();
    let mut hung_jobs = BTreeSet::new();
    let page_reports_hang = page_text.contains(HUNG_BUILD_PHRASE);

    for item in JOB_ITEM_RE.find_iter(html) {
        let tag = item.as_str();
        let status = CLASS_ATTR_RE
            .captures(tag)
            .map(|caps| caps[1].split_whitespace().next().unwrap_or("").to_string())
            .unwrap_or_default();
        if status != "Failed" && status != "Unknown" {
            continue;
        }

        let title = TITLE_ATTR_RE
            .captures(tag)
            .map(|caps| decode_entities(&caps[1]))
            .unwrap_or_default();
        if title.is_empty() || failed_jobs.iter().any(|j| j.job.name() == title) {
            continue;
        }
        let key = JOB_KEY_ATTR_RE.captures(tag).map(|caps| caps[1].to_string());

        let hung = status == "Unknown" && (page_reports_hang || HUNG_MARKER_RE.is_match(&title));

        let mut asan = None;
        let reason = if hung {
            "Hung build detected (logs quiet for extended period)".to_string()
        } else if status == "Unknown" {
            "Unknown status".to_string()
        } else if ASAN_JOB_RE.is_match(&title) {
            asan = asan_findings.first().cloned();
            match &asan {
                Some(finding) => finding.summary(),
                None => "AddressSanitizer detected issue - check job logs for details".to_string(),
            }
        } else {
            "Job failed".to_string()
        };

        let job = JobRef::new(title);
        if hung {
            hung_jobs.insert(job.clone());
        }
        failed_jobs.push(FailedJob {
            job,
            hung,
            reason,
            key,
            asan,
        });
    }

    (failed_jobs, hung_jobs)
}

/// AddressSanitizer annotations rendered on the report page.
fn parse_asan_findings(page_text: &str) -> Vec<AsanFinding> {
    let mut findings = Vec::new();

    for caps in ASAN_ERROR_RE.captures_iter(page_text) {
        let test_path = caps[1].trim_end_matches(&['.', ','][..]).to_string();
        let context_start = caps.get(0).unwrap().end();
        let context = &page_text[context_start..char_floor(page_text, context_start + 500)];

        let leak_count = LEAKS_TRIGGERED_RE
            .captures(context)
            .and_then(|caps| parse_count(&caps[1]));

        let test_name = PATH_TEST_RE
            .captures(&test_path)
            .map(|caps| format!("{}.{}", &caps[1], &caps[2]))
            .or_else(|| {
                BARE_TEST_RE
                    .captures(&test_path)
                    .map(|caps| caps[1].to_string())
            })
            .or_else(|| {
                test_path
                    .split('/')
                    .next()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            });

        let error_kind = if leak_count.is_some() {
            "memory-leak".to_string()
        } else {
            "asan-error".to_string()
        };

        findings.push(AsanFinding {
            test_path,
            test_name,
            leak_count,
            error_kind,
        });
    }

    findings
}

// ============================================================================
// Text helpers
// ============================================================================

/// Plain text of a markup fragment, whitespace collapsed to single spaces.
fn text_content(html: &str) -> String {
    let html = SCRIPT_RE.replace_all(html, " ");
    let html = STYLE_RE.replace_all(&html, " ");
    let text = TAG_RE.replace_all(&html, " ");
    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text preserving the fragment's own line structure (for block-quoted
/// reference citations, which are diagnostic payload and must stay verbatim).
fn verbatim_text(html: &str) -> String {
    let html = BR_RE.replace_all(html, "\n");
    let text = TAG_RE.replace_all(&html, "");
    decode_entities(&text).trim_matches('\n').to_string()
}

/// Failure detail text: whitespace collapsed between lines, except
/// blockquote/pre regions which are preserved verbatim.
fn detail_text(row_html: &str) -> String {
    let mut parts = Vec::new();
    let mut cursor = 0;

    for caps in BLOCK_QUOTE_RE.captures_iter(row_html) {
        let whole = caps.get(0).unwrap();
        let before = text_content(&row_html[cursor..whole.start()]);
        if !before.is_empty() {
            parts.push(before);
        }
        let quoted = verbatim_text(&caps[1]);
        if !quoted.is_empty() {
            parts.push(quoted);
        }
        cursor = whole.end();
    }
    let tail = text_content(&row_html[cursor..]);
    if !tail.is_empty() {
        parts.push(tail);
    }

    parts.join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Parse an integer that may carry thousands separators (`21,832`).
fn parse_count(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}
