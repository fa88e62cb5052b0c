//! Naming conventions: storage folders, inline policy names and policy document paths.
//!
//! Everything here is a pure function of `(kind, name)` and the storage root; nothing
//! touches the filesystem.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ProvisionError, ProvisionResult};
use crate::types::{IdentityKind, ResolvedNames};

/// Stem shared by every policy document file.
const POLICY_FILE_STEM: &str = "policy";

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("criterion", "criteria"),
    ("analysis", "analyses"),
    ("crisis", "crises"),
    ("thesis", "theses"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "deer",
    "equipment",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "software",
    "species",
];

const F_TO_VES: &[&str] = &[
    "calf", "half", "knife", "leaf", "life", "self", "shelf", "thief", "wife", "wolf",
];

/// English plural of a single noun.
///
/// Rule based with irregular and uncountable exception tables. A leading capital
/// letter is carried over to the result.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_ascii_lowercase();

    let plural = if UNCOUNTABLE.contains(&lower.as_str()) {
        lower.clone()
    } else if let Some((_, plural)) = IRREGULAR_PLURALS.iter().find(|(s, _)| *s == lower) {
        (*plural).to_string()
    } else if F_TO_VES.contains(&lower.as_str()) {
        let stem = lower
            .strip_suffix("fe")
            .or_else(|| lower.strip_suffix('f'))
            .unwrap_or(&lower);
        format!("{stem}ves")
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{lower}es")
    } else if let Some(stem) = lower.strip_suffix('y').filter(|stem| ends_with_consonant(stem)) {
        format!("{stem}ies")
    } else {
        format!("{lower}s")
    };

    if word.starts_with(|c: char| c.is_ascii_uppercase()) {
        let mut chars = plural.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => plural,
        }
    } else {
        plural
    }
}

fn ends_with_consonant(stem: &str) -> bool {
    stem.chars()
        .last()
        .is_some_and(|c| c.is_ascii_alphabetic() && !"aeiou".contains(c))
}

/// Storage folder (and identity list stem) for a kind: `roles`, `groups`.
pub fn storage_folder(kind: IdentityKind) -> String {
    pluralize(kind.as_str())
}

/// Title-cased name segment: every letter following a non-letter is uppercased,
/// every other letter lowercased, and all characters are kept.
pub fn title_case(name: &str) -> String {
    let mut titled = String::with_capacity(name.len());
    let mut after_letter = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if after_letter {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            titled.push(c);
            after_letter = false;
        }
    }
    titled
}

/// `{Kind}Policy{Name}`, e.g. `RolePolicyAdmin`.
pub fn policy_name(kind: IdentityKind, name: &str) -> String {
    format!("{}Policy{}", kind.title(), title_case(name))
}

/// `{root}/{plural kind}/policy-{name}.json`
pub fn custom_policy_path(storage_root: &Path, kind: IdentityKind, name: &str) -> PathBuf {
    storage_root
        .join(storage_folder(kind))
        .join(format!("{POLICY_FILE_STEM}-{name}.json"))
}

/// Strip `-{name}` from the file stem of a custom policy path, yielding the
/// document shared by every definition of that kind.
pub fn strip_identity_suffix(custom_policy_path: &Path, name: &str) -> Option<PathBuf> {
    let stem = custom_policy_path.file_stem()?.to_str()?;
    let base_stem = stem.strip_suffix(&format!("-{name}"))?;
    let extension = custom_policy_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("json");
    Some(custom_policy_path.with_file_name(format!("{base_stem}.{extension}")))
}

/// Derive the policy name and document paths for one definition.
pub fn resolve(storage_root: &Path, kind: IdentityKind, name: &str) -> ResolvedNames {
    let custom_policy_path = custom_policy_path(storage_root, kind, name);
    let base_policy_path = match kind {
        IdentityKind::Role => strip_identity_suffix(&custom_policy_path, name),
        IdentityKind::Group => None,
    };

    ResolvedNames {
        policy_name: policy_name(kind, name),
        custom_policy_path,
        base_policy_path,
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_+=,.@-]+$").expect("name pattern is valid"))
}

/// Check a principal name against IAM's name grammar and length limit.
///
/// A valid name is always a single path component, so resolved paths stay inside
/// the kind's storage folder.
pub fn validate_name(kind: IdentityKind, name: &str, source: &Path) -> ProvisionResult<()> {
    if !name_pattern().is_match(name) {
        return Err(ProvisionError::malformed(
            source,
            format!("invalid {kind} name '{name}': allowed characters are A-Z a-z 0-9 _+=,.@-"),
        ));
    }
    if name.len() > kind.max_name_len() {
        return Err(ProvisionError::malformed(
            source,
            format!(
                "invalid {kind} name '{name}': longer than {} characters",
                kind.max_name_len()
            ),
        ));
    }
    Ok(())
}
