use tracing::{debug, info};

use crate::bank::factory::BankRegistry;
use crate::data::loader::LoadedData;
use crate::descriptor::ids::BankId;
use crate::descriptor::normalized_model::{NormalizedDescriptor, NormalizedPage};
use crate::descriptor::ordered::OrderedMap;
use crate::error::CompileError;
use crate::graph::context::{BuildContext, CompiledContext, PageContext};
use crate::grid::grid::{BankFootprint, GridConfig, apply_grid};
use crate::trace::trace::CompileEvent;

/// A compiled context plus every tolerated anomaly met on the way.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub context: CompiledContext,
    pub events: Vec<CompileEvent>,
}

/// Instantiate every bank, resolve every connection and lay out every page.
///
/// Pages, banks and connections are processed in declaration order. After
/// each page's connections, callbacks nothing feeds get the page-load
/// trigger.
pub fn assemble(
    desc: &NormalizedDescriptor,
    data: &LoadedData,
    registry: &BankRegistry,
    grid: &GridConfig,
    strict: bool,
) -> Result<Compilation, CompileError> {
    let mut ctx = BuildContext::new(strict);
    let mut pages = OrderedMap::new();

    for (pageid, page) in desc.pages.iter() {
        info!("creating page {} ({} banks)", pageid, page.banks.len());
        let footprints = create_banks(page, data, registry, &mut ctx)?;

        for connection in &page.connections {
            ctx.connect(connection)?;
        }
        ctx.fallback();

        let (page_grid, overflow) = apply_grid(page, &footprints, grid);
        ctx.record_all(overflow);

        pages.insert(
            pageid.clone(),
            PageContext {
                title: page.title.clone(),
                subtitle: page.subtitle.clone(),
                intro: page.intro.clone(),
                sidebar: page.sidebar.clone(),
                layout: page_grid.layout,
                banks: page_grid.banks,
            },
        );
        debug!(
            "page {} connected: {} callbacks, {} connectors so far",
            pageid,
            ctx.callbacks().len(),
            ctx.connectors().len()
        );
    }

    let assembled = ctx.finish()?;
    let context = CompiledContext {
        name: desc.name.clone(),
        theme: desc.theme.clone(),
        appbar: desc.appbar.clone(),
        show_help: desc.show_help,
        data: desc.data.clone(),
        pages,
        banks: assembled.banks,
        widgets: assembled.widgets,
        outputs: assembled.outputs,
        connectors: assembled.connectors,
        callbacks: assembled.callbacks,
    };
    Ok(Compilation {
        context,
        events: assembled.events,
    })
}

fn create_banks(
    page: &NormalizedPage,
    data: &LoadedData,
    registry: &BankRegistry,
    ctx: &mut BuildContext,
) -> Result<OrderedMap<BankId, BankFootprint>, CompileError> {
    let mut footprints = OrderedMap::new();

    for bank in page.banks.values() {
        if !registry.contains(&bank.bank_type) {
            return Err(CompileError::UnknownBankType {
                bank: bank.uid.clone(),
                bank_type: bank.bank_type.clone(),
            });
        }

        let (dataid, dataset) = match bank
            .dataid
            .as_deref()
            .and_then(|id| data.get(id).map(|ds| (id, ds)))
        {
            Some(found) => found,
            None => {
                return Err(CompileError::MissingDataSource {
                    bank: bank.uid.clone(),
                    dataid: bank.dataid.clone(),
                });
            }
        };

        let output = registry.create(&bank.bank_type, &bank.uid, dataid, dataset, &bank.args)?;
        let sizing = ctx.register_bank(&bank.uid, output)?;
        footprints.insert(
            bank.uid.clone(),
            BankFootprint::new(sizing, bank.width, bank.height, bank.position),
        );
    }

    Ok(footprints)
}
