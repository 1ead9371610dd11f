/*!
Links archived parents to archived children at registration time
*/

use tracing::debug;

use crate::archive::destination::Destination;
use crate::archive::entity::Entity;
use crate::archive::registry::{Registry, Selector};

/// Give `destination` a copy of every cascading association of `source` whose
/// target is archived too, pointed at the target's archive table.
///
/// Only links are written; no rows move. Targets registered after `source`
/// are not seen. A self-referencing association points at `destination`.
pub(crate) fn link_archived_associations(
    registry: &Registry,
    source: &Entity,
    destination: &mut Destination,
) -> usize {
    let mut linked = 0;

    for association in source.associations().iter().filter(|a| a.cascades()) {
        let archive_table = if association.target_table == source.table() {
            destination.table().to_string()
        } else {
            let targets = registry.find(Selector::tables([association.target_table.as_str()]));
            let Some(archive) = targets.first().and_then(|config| config.to.first()) else {
                continue;
            };
            archive.table().to_string()
        };

        debug!(
            "Linking {}.{} -> {} ({})",
            destination.table(),
            association.name,
            archive_table,
            association.foreign_key
        );
        destination.link(association.retarget(&archive_table));
        linked += 1;
    }

    linked
}
