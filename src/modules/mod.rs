pub mod books;
pub mod crawler;

use catalog_kernel::ModuleRegistry;

use crate::ingest::Pipeline;
use crate::moderation::ModerationQueue;

/// Register every catalog module with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    queue: ModerationQueue,
    pipeline: Pipeline,
) -> anyhow::Result<()> {
    registry.register(books::create_module(queue))?;
    registry.register(crawler::create_module(pipeline))?;
    Ok(())
}
