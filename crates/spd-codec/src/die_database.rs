//! Die revision and process inference from module part numbers.
//!
//! Everything here is a heuristic over vendor naming conventions. Results
//! are display hints only and never feed back into the image.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Attached to every inference result shown to a user.
pub const DIE_INFERENCE_NOTE: &str = "inferred from part number; not authoritative";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DieRule {
    /// Vendor part-number structure with a revision character.
    Structural,
    /// Longest matching prefix in the static table.
    Prefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DieInfo {
    pub die_type: &'static str,
    pub process: &'static str,
    pub manufacturer: &'static str,
    pub rule: DieRule,
}

// ── Rule tables ───────────────────────────────────────────────────────────

struct StructuralRule {
    manufacturer: &'static str,
    /// Must capture the revision character as group 1.
    pattern: &'static str,
    min_len: usize,
    revisions: &'static [(char, &'static str, &'static str)],
}

/// SK Hynix DDR4: `HMA` + capacity/variant + fixed `R7` + revision letter.
static HYNIX_REVISIONS: &[(char, &str, &str)] = &[
    ('A', "A-die", "21nm (Deneb)"),
    ('B', "B-die", "18nm (M17B)"),
    ('C', "C-die", "1ynm"),
    ('D', "D-die", "1znm"),
    ('E', "E-die", "1anm"),
    ('F', "F-die", "25nm (Legacy)"),
    ('J', "J-die", "20nm"),
    ('M', "M-die", "20nm"),
];

static STRUCTURAL_RULES: &[StructuralRule] = &[StructuralRule {
    manufacturer: "SK Hynix",
    pattern: r"^HMA.*?R7(.)",
    min_len: 10,
    revisions: HYNIX_REVISIONS,
}];

struct PrefixRule {
    prefix: &'static str,
    die_type: &'static str,
    process: &'static str,
    manufacturer: &'static str,
}

static PREFIX_RULES: &[PrefixRule] = &[
    PrefixRule { prefix: "M378A", die_type: "A-die", process: "20nm", manufacturer: "Samsung" },
    PrefixRule { prefix: "M378B", die_type: "B-die", process: "18nm", manufacturer: "Samsung" },
    PrefixRule { prefix: "M391A", die_type: "A-die", process: "20nm", manufacturer: "Samsung" },
    PrefixRule { prefix: "M391B", die_type: "B-die", process: "18nm", manufacturer: "Samsung" },
    PrefixRule { prefix: "M393A", die_type: "A-die", process: "20nm", manufacturer: "Samsung" },
    PrefixRule { prefix: "M393B", die_type: "B-die", process: "18nm", manufacturer: "Samsung" },
    PrefixRule { prefix: "M386A", die_type: "B-die", process: "18nm", manufacturer: "Samsung" },
    PrefixRule { prefix: "M386B", die_type: "B-die", process: "18nm", manufacturer: "Samsung" },
    PrefixRule { prefix: "MTA", die_type: "Rev-A", process: "20nm", manufacturer: "Micron" },
    PrefixRule { prefix: "MTB", die_type: "Rev-B", process: "16nm", manufacturer: "Micron" },
    PrefixRule { prefix: "MTC", die_type: "Rev-C", process: "14nm", manufacturer: "Micron" },
];

const MAX_PREFIX_LEN: usize = 6;
const MIN_PREFIX_LEN: usize = 3;

fn compiled_rules() -> &'static [(&'static StructuralRule, Regex)] {
    static COMPILED: OnceLock<Vec<(&'static StructuralRule, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        STRUCTURAL_RULES
            .iter()
            .filter_map(|rule| match Regex::new(rule.pattern) {
                Ok(re) => Some((rule, re)),
                Err(err) => {
                    tracing::error!(pattern = rule.pattern, %err, "skipping die rule");
                    None
                }
            })
            .collect()
    })
}

// ── Inference ─────────────────────────────────────────────────────────────

/// A registry name and a rule's vendor agree when either contains the other,
/// ignoring case ("Micron Technology" matches "Micron").
fn vendor_matches(manufacturer: Option<&str>, vendor: &str) -> bool {
    match manufacturer.map(str::trim) {
        None | Some("") => true,
        Some(given) => {
            let given = given.to_ascii_lowercase();
            let vendor = vendor.to_ascii_lowercase();
            given.contains(&vendor) || vendor.contains(&given)
        }
    }
}

fn infer_structural(part: &str, manufacturer: Option<&str>) -> Option<DieInfo> {
    compiled_rules().iter().find_map(|(rule, re)| {
        if part.len() < rule.min_len || !vendor_matches(manufacturer, rule.manufacturer) {
            return None;
        }
        let rev = re.captures(part)?.get(1)?.as_str().chars().next()?;
        let &(_, die_type, process) = rule.revisions.iter().find(|(c, _, _)| *c == rev)?;
        Some(DieInfo {
            die_type,
            process,
            manufacturer: rule.manufacturer,
            rule: DieRule::Structural,
        })
    })
}

fn infer_prefix(part: &str, manufacturer: Option<&str>) -> Option<DieInfo> {
    let longest = part.len().min(MAX_PREFIX_LEN);
    (MIN_PREFIX_LEN..=longest).rev().find_map(|len| {
        let prefix = part.get(..len)?;
        let rule = PREFIX_RULES.iter().find(|r| r.prefix == prefix)?;
        if !vendor_matches(manufacturer, rule.manufacturer) {
            return None;
        }
        Some(DieInfo {
            die_type: rule.die_type,
            process: rule.process,
            manufacturer: rule.manufacturer,
            rule: DieRule::Prefix,
        })
    })
}

/// Infers the die revision from a part number.
///
/// `manufacturer` is the decoded module manufacturer, if known; a rule whose
/// vendor disagrees with it is skipped. Returns `None` when nothing matches.
pub fn infer_die(part_number: &str, manufacturer: Option<&str>) -> Option<DieInfo> {
    let part = part_number.trim().to_ascii_uppercase();
    if part.is_empty() {
        return None;
    }
    let found = infer_structural(&part, manufacturer).or_else(|| infer_prefix(&part, manufacturer));
    match &found {
        Some(info) => tracing::debug!(
            part = %part,
            die = info.die_type,
            rule = ?info.rule,
            "die inferred"
        ),
        None => tracing::debug!(part = %part, "no die rule matched"),
    }
    found
}

/// `"16 Gb B-die (18nm)"`, `"8 Gb"`, or `"Unknown"` without a density.
pub fn describe_die(die: Option<&DieInfo>, density_mbit: Option<u32>) -> String {
    let density = match density_mbit {
        Some(0) | None => return "Unknown".to_string(),
        Some(mbit) if mbit >= 1024 => format!("{} Gb", mbit / 1024),
        Some(mbit) => format!("{mbit} Mb"),
    };
    match die {
        Some(info) => format!("{density} {} ({})", info.die_type, info.process),
        None => density,
    }
}
