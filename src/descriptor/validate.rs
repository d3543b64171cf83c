use std::sync::LazyLock;

use regex::Regex;

use crate::descriptor::descriptor_model::Descriptor;
use crate::descriptor::ids::{BANK_DELIM, SINK_DELIM};
use crate::error::ValidationError;

static UID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9_]{2,}$").expect("uid pattern is valid")
});

static WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+( \w+)*$").expect("words pattern is valid")
});

/// Page ids, bank names and bank types: lowercase word characters, length
/// 2+, no leading, trailing or doubled underscores.
pub fn is_valid_uid(text: &str) -> bool {
    UID_RE.is_match(text)
        && !text.starts_with('_')
        && !text.ends_with('_')
        && !text.contains(BANK_DELIM)
}

/// Check a raw descriptor, collecting every violation before failing.
pub fn validate(desc: &Descriptor) -> Result<(), ValidationError> {
    let mut err = ValidationError::default();

    if let Some(theme) = &desc.theme {
        if !WORDS_RE.is_match(theme) {
            err.push("theme", format!("'{}' is not one or more words", theme));
        }
    }

    if desc.pages.is_empty() {
        err.push("pages", "at least one page is required");
    }

    for (pageid, page) in desc.pages.iter() {
        let page_path = format!("pages.{}", pageid);
        if !is_valid_uid(pageid) {
            err.push(&page_path, format!("'{}' is not a valid page id", pageid));
        }

        let banks = match &page.banks {
            Some(banks) => banks,
            None => {
                err.push(format!("{}.banks", page_path), "required key is missing");
                continue;
            }
        };
        if banks.is_empty() {
            err.push(format!("{}.banks", page_path), "at least one bank is required");
        }

        for (bankname, bank) in banks.iter() {
            let bank_path = format!("{}.banks.{}", page_path, bankname);
            if !is_valid_uid(bankname) {
                err.push(&bank_path, format!("'{}' is not a valid bank id", bankname));
            }
            if !is_valid_uid(&bank.bank_type) {
                err.push(
                    format!("{}.type", bank_path),
                    format!("'{}' is not a valid bank type", bank.bank_type),
                );
            }
        }

        if let Some(connections) = &page.connections {
            // Dangling sources are pruned by normalization, not rejected
            let live = connections
                .iter()
                .filter(|(source, _)| banks.contains_key(source.as_str()));
            for (source, sinks) in live {
                for sink in sinks {
                    let pattern = format!("{}{}{}", pageid, SINK_DELIM, sink);
                    if let Err(e) = Regex::new(&pattern) {
                        err.push(
                            format!("{}.connections.{}", page_path, source),
                            format!("sink pattern '{}' does not compile: {}", sink, e),
                        );
                    }
                }
            }
        }
    }

    if err.is_empty() { Ok(()) } else { Err(err) }
}
