use tracing::{debug, info};

use crate::descriptor::descriptor_model::{BankSpec, DataSourceSpec, Descriptor, Page};
use crate::descriptor::ids::{BankId, SINK_DELIM, titlize};
use crate::descriptor::normalized_model::{
    COLLAPSED_MARKER, Connection, DEFAULT_CALL, DEFAULT_NAME, DEFAULT_THEME, DataSource,
    LayoutSlot, NormalizedBank, NormalizedDescriptor, NormalizedPage, SidebarEntry,
};
use crate::descriptor::ordered::OrderedMap;
use crate::descriptor::validate::validate;
use crate::error::ValidationError;

/// Validate a raw descriptor and rewrite it into canonical form.
///
/// Dangling references (connection sources, layout and sidebar entries that
/// name banks not in `page.banks`) are dropped silently. Malformed ids and a
/// missing `banks` key fail with every violation listed.
pub fn normalize(desc: &Descriptor) -> Result<NormalizedDescriptor, ValidationError> {
    validate(desc)?;
    info!("normalizing descriptor ({} pages)", desc.pages.len());

    let data: OrderedMap<String, DataSource> = desc
        .data
        .iter()
        .flat_map(|sources| sources.iter())
        .map(|(dataid, spec)| (dataid.clone(), normalize_source(spec)))
        .collect();
    let first_dataid = data.first().map(|(id, _)| id.clone());

    let mut pages = OrderedMap::new();
    for (pageid, page) in desc.pages.iter() {
        let normalized = normalize_page(pageid, page, first_dataid.as_deref());
        debug!(
            page = %pageid,
            banks = normalized.banks.len(),
            connections = normalized.connections.len(),
            "page normalized"
        );
        pages.insert(pageid.clone(), normalized);
    }

    Ok(NormalizedDescriptor {
        name: desc.name.clone().unwrap_or_else(|| DEFAULT_NAME.to_string()),
        theme: desc.theme.clone().unwrap_or_else(|| DEFAULT_THEME.to_string()),
        appbar: desc.appbar.clone().unwrap_or_default(),
        show_help: desc.show_help.unwrap_or(false),
        data,
        pages,
    })
}

fn normalize_source(spec: &DataSourceSpec) -> DataSource {
    DataSource {
        module: spec.module.clone(),
        call: spec.call.clone().unwrap_or_else(|| DEFAULT_CALL.to_string()),
        args: spec.args.clone().unwrap_or_default(),
    }
}

fn normalize_page(pageid: &str, page: &Page, first_dataid: Option<&str>) -> NormalizedPage {
    let empty = OrderedMap::new();
    // Presence of `banks` is enforced by validation
    let declared = page.banks.as_ref().unwrap_or(&empty);

    let connections = page
        .connections
        .iter()
        .flat_map(|conns| conns.iter())
        .filter(|(source, _)| declared.contains_key(source.as_str()))
        .map(|(source, sinks)| {
            let mut rewritten: Vec<String> = Vec::with_capacity(sinks.len());
            for sink in sinks {
                let pattern = format!("{}{}{}", pageid, SINK_DELIM, sink);
                if !rewritten.contains(&pattern) {
                    rewritten.push(pattern);
                }
            }
            Connection {
                source: BankId::new(pageid, source),
                sinks: rewritten,
            }
        })
        .collect();

    let layout = page
        .layout
        .iter()
        .flatten()
        .map(|row| {
            row.iter()
                .filter(|name| declared.contains_key(name.as_str()))
                .map(|name| LayoutSlot {
                    bankid: BankId::new(pageid, name),
                })
                .collect()
        })
        .collect();

    let sidebar = page
        .sidebar
        .iter()
        .flatten()
        .filter_map(|entry| {
            let (name, open) = match entry.strip_prefix(COLLAPSED_MARKER) {
                Some(stripped) => (stripped, false),
                None => (entry.as_str(), true),
            };
            declared.contains_key(name).then(|| SidebarEntry {
                bankid: BankId::new(pageid, name),
                title: titlize(name),
                open,
            })
        })
        .collect();

    let default_dataid = page.dataid.as_deref().or(first_dataid);
    let banks = declared
        .iter()
        .map(|(name, spec)| {
            let uid = BankId::new(pageid, name);
            (uid.to_string(), normalize_bank(uid, spec, default_dataid))
        })
        .collect();

    NormalizedPage {
        pageid: pageid.to_string(),
        title: page.title.clone().unwrap_or_default(),
        subtitle: page.subtitle.clone().unwrap_or_default(),
        intro: page.intro.clone(),
        dataid: page.dataid.clone(),
        banks,
        layout,
        sidebar,
        connections,
    }
}

fn normalize_bank(uid: BankId, spec: &BankSpec, default_dataid: Option<&str>) -> NormalizedBank {
    NormalizedBank {
        uid,
        bank_type: spec.bank_type.clone(),
        dataid: spec
            .dataid
            .clone()
            .or_else(|| default_dataid.map(str::to_string)),
        width: spec.width,
        height: spec.height,
        position: spec.position,
        args: spec.args.clone(),
    }
}

// ============================================================================
// Projection back to a raw descriptor
// ============================================================================

impl From<&NormalizedDescriptor> for Descriptor {
    /// Every default made explicit; normalizing the result reproduces `norm`.
    fn from(norm: &NormalizedDescriptor) -> Self {
        let data = norm
            .data
            .iter()
            .map(|(dataid, source)| {
                let spec = DataSourceSpec {
                    module: source.module.clone(),
                    call: Some(source.call.clone()),
                    args: Some(source.args.clone()),
                };
                (dataid.clone(), spec)
            })
            .collect();

        let pages = norm
            .pages
            .iter()
            .map(|(pageid, page)| (pageid.clone(), Page::from(page)))
            .collect();

        Descriptor {
            name: Some(norm.name.clone()),
            theme: Some(norm.theme.clone()),
            appbar: Some(norm.appbar.clone()),
            show_help: Some(norm.show_help),
            data: Some(data),
            pages,
        }
    }
}

impl From<&NormalizedPage> for Page {
    fn from(page: &NormalizedPage) -> Self {
        let sink_prefix = format!("{}{}", page.pageid, SINK_DELIM);

        let banks = page
            .banks
            .values()
            .map(|bank| {
                let spec = BankSpec {
                    bank_type: bank.bank_type.clone(),
                    dataid: bank.dataid.clone(),
                    width: bank.width,
                    height: bank.height,
                    position: bank.position,
                    args: bank.args.clone(),
                };
                (bank.uid.bankid.clone(), spec)
            })
            .collect();

        let layout = page
            .layout
            .iter()
            .map(|row| row.iter().map(|slot| slot.bankid.bankid.clone()).collect())
            .collect();

        let sidebar = page
            .sidebar
            .iter()
            .map(|entry| {
                if entry.open {
                    entry.bankid.bankid.clone()
                } else {
                    format!("{}{}", COLLAPSED_MARKER, entry.bankid.bankid)
                }
            })
            .collect();

        let connections = page
            .connections
            .iter()
            .map(|conn| {
                let sinks = conn
                    .sinks
                    .iter()
                    .map(|s| s.strip_prefix(&sink_prefix).unwrap_or(s.as_str()).to_string())
                    .collect();
                (conn.source.bankid.clone(), sinks)
            })
            .collect();

        Page {
            title: Some(page.title.clone()),
            subtitle: Some(page.subtitle.clone()),
            intro: page.intro.clone(),
            dataid: page.dataid.clone(),
            banks: Some(banks),
            layout: Some(layout),
            sidebar: Some(sidebar),
            connections: Some(connections),
        }
    }
}
