//! Wallet journal parsing and session aggregation.
//!
//! Input is the raw text a player copies out of the in-game wallet: one
//! column-aligned row per transaction, locale thousands separators, a
//! trailing cents fraction, and `YYYY.MM.DD HH:MM:SS` UTC timestamps.
//! Only incursion payout rows are kept; everything else in the paste is
//! silently ignored.
//!
//! Two payouts landing in the same clock second are treated as one site
//! paying several characters at once (an alt or a fleetmate). That is a
//! heuristic, not a guaranteed signal, and is kept as-is.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::payout::PayoutTable;
use crate::record::PerformanceRecord;

const CURRENCY_MARKER: &str = "ISK";
const REWARD_MARKER: &str = "reward payout";
const COMPLETION_MARKER: &str = "concord";
const DATETIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

// The client's copy format is column-aligned, not strictly tab-delimited.
fn column_splitter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\t|\s{2,}").expect("column splitter pattern"))
}

fn cents_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.,]\d{2} ").expect("cents pattern"))
}

/// One payout line, before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParsedTransaction {
    time: DateTime<Utc>,
    value: u64,
}

/// A payout line annotated with its table match, for per-row display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayoutRow {
    /// Unix seconds of the payout.
    pub time: u64,
    /// ISK amount of the line.
    pub isk: u64,
    /// LP yield when the amount matched the payout table.
    pub lp: Option<u64>,
    /// On-grid fleet size when the amount matched an overfilled site.
    pub on_grid: Option<u32>,
}

/// Aggregated record plus the annotated rows it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletBreakdown {
    pub record: PerformanceRecord,
    pub rows: Vec<PayoutRow>,
}

fn parse_line(line: &str) -> Option<ParsedTransaction> {
    let mut fields = column_splitter().split(line);
    let datetime = fields.next()?;
    let kind = fields.next()?;
    let value = fields.next()?;
    let _balance = fields.next()?;
    let description = fields.next()?;

    if !value.contains(CURRENCY_MARKER) {
        return None;
    }
    // Both markers must match to avoid unrelated reward text.
    if !kind.to_lowercase().contains(REWARD_MARKER)
        || !description.to_lowercase().contains(COMPLETION_MARKER)
    {
        return None;
    }

    let without_cents = cents_suffix().replace(value, " ");
    let digits: String = without_cents.chars().filter(char::is_ascii_digit).collect();
    let value = digits.parse::<u64>().ok()?;

    let naive = NaiveDateTime::parse_from_str(datetime.trim(), DATETIME_FORMAT).ok()?;
    Some(ParsedTransaction {
        time: naive.and_utc(),
        value,
    })
}

fn gap_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}

fn unix_seconds(time: DateTime<Utc>) -> u64 {
    u64::try_from(time.timestamp()).unwrap_or(0)
}

#[derive(Debug, Default)]
struct SessionTotals {
    isk: u64,
    lp: u64,
    sites: u32,
    chars: u32,
    gaps: Vec<u64>,
    rows: Vec<PayoutRow>,
}

fn aggregate(lines: &[ParsedTransaction], table: &PayoutTable) -> SessionTotals {
    let mut totals = SessionTotals {
        chars: 1,
        rows: Vec::with_capacity(lines.len()),
        ..SessionTotals::default()
    };
    let mut run = 1u32;
    let mut last_time: Option<DateTime<Utc>> = None;

    for tx in lines {
        match last_time {
            Some(prev) if prev == tx.time => {
                // Paid in the same second? It's an alt.
                run += 1;
                totals.chars = totals.chars.max(run);
            }
            Some(prev) => {
                totals.gaps.push(gap_seconds(prev, tx.time));
                totals.sites += 1;
                run = 1;
                last_time = Some(tx.time);
            }
            None => {
                totals.sites += 1;
                last_time = Some(tx.time);
            }
        }

        totals.isk += tx.value;
        let hit = table.lookup(tx.value);
        if let Some(entry) = hit {
            totals.lp += entry.lp;
        }
        totals.rows.push(PayoutRow {
            time: unix_seconds(tx.time),
            isk: tx.value,
            lp: hit.map(|entry| entry.lp),
            on_grid: hit.and_then(|entry| entry.on_grid),
        });
    }
    totals
}

/// Parse pasted wallet text into a record plus its per-row breakdown.
///
/// Returns `None` when fewer than two distinct payout timestamps were
/// found: a single site has no gap to measure, so there is no session to
/// summarize. That is insufficient data, not an error.
#[must_use]
pub fn parse_wallet_breakdown(input: &str, table: &PayoutTable) -> Option<WalletBreakdown> {
    let mut lines: Vec<ParsedTransaction> = input.lines().filter_map(parse_line).collect();
    // Load-bearing ordering: groups same-second payouts adjacently and
    // makes ties deterministic regardless of paste order.
    lines.sort_by_key(|tx| (tx.time, tx.value));

    let totals = aggregate(&lines, table);
    if totals.gaps.is_empty() {
        return None;
    }

    let record = PerformanceRecord {
        isk: totals.isk,
        lp: totals.lp,
        sites: totals.sites,
        start_time: totals.rows.iter().map(|row| row.time).min()?,
        end_time: totals.rows.iter().map(|row| row.time).max()?,
        min_time: totals.gaps.iter().copied().min()?,
        max_time: totals.gaps.iter().copied().max()?,
        chars: totals.chars,
    };
    Some(WalletBreakdown {
        record,
        rows: totals.rows,
    })
}

/// Parse pasted wallet text into just the aggregate record.
#[must_use]
pub fn parse_wallet(input: &str, table: &PayoutTable) -> Option<PerformanceRecord> {
    parse_wallet_breakdown(input, table).map(|breakdown| breakdown.record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HQ_LINE: &str = "2024.01.01 10:00:00\tIncursion Reward Payout\t31,500,000.00 ISK\t2,063,000,000.00 ISK\tCONCORD reward for Incursion completion";

    fn hq_line_at(datetime: &str) -> String {
        HQ_LINE.replace("2024.01.01 10:00:00", datetime)
    }

    #[test]
    fn payout_line_parses_amount_and_time() {
        let tx = parse_line(HQ_LINE).expect("valid payout line");
        assert_eq!(tx.value, 31_500_000);
        assert_eq!(tx.time.timestamp(), 1_704_103_200);
    }

    #[test]
    fn column_aligned_lines_parse_like_tabbed_ones() {
        let aligned = HQ_LINE.replace('\t', "   ");
        assert_eq!(parse_line(&aligned), parse_line(HQ_LINE));
    }

    #[test]
    fn non_payout_lines_are_ignored() {
        // Missing currency marker.
        assert!(parse_line(&HQ_LINE.replace(" ISK", "")).is_none());
        // Reward marker without the completion marker.
        assert!(parse_line(&HQ_LINE.replace("CONCORD", "Agent")).is_none());
        // Completion marker without the reward marker.
        assert!(parse_line(&HQ_LINE.replace("Incursion Reward Payout", "Bounty")).is_none());
        // Too few columns.
        assert!(parse_line("2024.01.01 10:00:00\tIncursion Reward Payout").is_none());
        // Unparseable datetime.
        assert!(parse_line(&hq_line_at("yesterday, about noon")).is_none());
    }

    #[test]
    fn same_second_payouts_count_one_site_two_chars() {
        let input = format!(
            "{HQ_LINE}\n{HQ_LINE}\n{}",
            hq_line_at("2024.01.01 10:05:00")
        );
        let record = parse_wallet(&input, PayoutTable::shared()).expect("record");
        assert_eq!(record.sites, 2);
        assert_eq!(record.chars, 2);
        assert_eq!(record.isk, 94_500_000);
        assert_eq!(record.lp, 21_000);
        assert_eq!(record.min_time, 300);
        assert_eq!(record.max_time, 300);
    }

    #[test]
    fn unmatched_amount_counts_isk_but_no_lp() {
        let odd = HQ_LINE.replace("31,500,000.00", "31,499,999.00");
        let input = format!("{odd}\n{}", hq_line_at("2024.01.01 10:10:00"));
        let breakdown =
            parse_wallet_breakdown(&input, PayoutTable::shared()).expect("breakdown");
        assert_eq!(breakdown.record.isk, 31_499_999 + 31_500_000);
        assert_eq!(breakdown.record.lp, 7_000);
        assert_eq!(breakdown.rows[0].lp, None);
        assert_eq!(breakdown.rows[1].lp, Some(7_000));
    }

    #[test]
    fn same_second_pair_aggregates_one_site_before_gap_policy() {
        let lines: Vec<_> = format!("{HQ_LINE}\n{HQ_LINE}")
            .lines()
            .filter_map(parse_line)
            .collect();
        let totals = aggregate(&lines, PayoutTable::shared());
        assert_eq!(totals.sites, 1);
        assert_eq!(totals.chars, 2);
        assert_eq!(totals.isk, 63_000_000);
        assert_eq!(totals.lp, 14_000);
        assert!(totals.gaps.is_empty());
    }

    #[test]
    fn single_timestamp_yields_no_record() {
        let input = format!("{HQ_LINE}\n{HQ_LINE}");
        assert!(parse_wallet(&input, PayoutTable::shared()).is_none());
        assert!(parse_wallet("", PayoutTable::shared()).is_none());
        assert!(parse_wallet("not a wallet at all", PayoutTable::shared()).is_none());
    }
}
