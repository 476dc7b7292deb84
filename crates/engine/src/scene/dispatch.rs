use tracing::{debug, warn};

use crate::services::{SceneServices, ServiceError};

use super::descriptor::{ResourceKind, ResourceListEntry};
use super::error::SceneError;
use super::state::{BackgroundImage, BackgroundMask, RenderMode, SceneAnimation, SceneAssets};

/// A resource list entry paired with the bytes fetched for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadedResource {
    pub(crate) entry: ResourceListEntry,
    pub(crate) data: Vec<u8>,
}

/// Routes every loaded resource to its subsystem, in list order.
///
/// Stops at the first fatal resource. Whatever was installed before that point
/// stays in `assets` and the collaborators; the caller unwinds it.
pub(crate) fn dispatch_resources(
    resources: Vec<LoadedResource>,
    assets: &mut SceneAssets,
    services: &mut SceneServices,
) -> Result<(), SceneError> {
    for resource in resources {
        dispatch_one(resource, assets, services)?;
    }
    Ok(())
}

fn dispatch_one(
    resource: LoadedResource,
    assets: &mut SceneAssets,
    services: &mut SceneServices,
) -> Result<(), SceneError> {
    let LoadedResource { entry, data } = resource;
    let id = entry.resource_id;
    let kind = entry.kind();
    let decode_err = |source: ServiceError| SceneError::Decode {
        resource: id,
        kind,
        source,
    };

    match kind {
        ResourceKind::BackgroundImage => {
            if assets.background.is_some() {
                return Err(SceneError::DuplicateResource { resource: id, kind });
            }
            claim_render_mode(assets, RenderMode::Normal, id, kind)?;
            let image = services.images.decode(&data).map_err(decode_err)?;
            debug!(
                resource = id,
                width = image.width,
                height = image.height,
                "scene_background_loaded"
            );
            assets.background = Some(BackgroundImage {
                width: image.width,
                height: image.height,
                pixels: image.pixels,
                palette: image.palette,
            });
        }
        ResourceKind::BackgroundMask => {
            let image = services.images.decode(&data).map_err(decode_err)?;
            if assets.mask.is_some() {
                warn!(resource = id, "scene_mask_duplicate");
            }
            debug!(
                resource = id,
                width = image.width,
                height = image.height,
                "scene_mask_loaded"
            );
            assets.mask = Some(BackgroundMask {
                width: image.width,
                height: image.height,
                pixels: image.pixels,
            });
        }
        ResourceKind::ObjectNameList => match services.object_map.load_names(&data) {
            Ok(()) => debug!(resource = id, "scene_object_names_loaded"),
            Err(err) => warn!(resource = id, error = %err, "scene_object_names_rejected"),
        },
        ResourceKind::ObjectMap => {
            services.object_map.load_map(&data).map_err(decode_err)?;
            debug!(resource = id, "scene_object_map_loaded");
        }
        ResourceKind::ActionMap => {
            services.action_map.load_map(&data).map_err(decode_err)?;
            debug!(resource = id, "scene_action_map_loaded");
        }
        ResourceKind::IsoTileset => {
            claim_render_mode(assets, RenderMode::Isometric, id, kind)?;
            services.iso_map.load_tileset(&data).map_err(decode_err)?;
            debug!(resource = id, "scene_iso_tileset_loaded");
        }
        ResourceKind::IsoMetamap => {
            claim_render_mode(assets, RenderMode::Isometric, id, kind)?;
            services.iso_map.load_metamap(&data).map_err(decode_err)?;
            debug!(resource = id, "scene_iso_metamap_loaded");
        }
        ResourceKind::IsoMetatileset => {
            claim_render_mode(assets, RenderMode::Isometric, id, kind)?;
            services.iso_map.load_metatileset(&data).map_err(decode_err)?;
            debug!(resource = id, "scene_iso_metatileset_loaded");
        }
        ResourceKind::Animation(sub_kind) => {
            let handle = services.animations.load(&data).map_err(decode_err)?;
            debug!(
                resource = id,
                sub_kind,
                handle = handle.0,
                "scene_animation_loaded"
            );
            assets.animations.push(SceneAnimation {
                handle,
                resource_id: id,
            });
        }
        ResourceKind::PaletteCycle => match services.palette_cycles.load(&data) {
            Ok(()) => {
                assets.palette_cycle = true;
                debug!(resource = id, "scene_palette_cycle_loaded");
            }
            Err(err) => warn!(resource = id, error = %err, "scene_palette_cycle_rejected"),
        },
        ResourceKind::Unknown(code) => {
            warn!(resource = id, resource_type = code, "scene_resource_type_unknown");
        }
    }
    Ok(())
}

fn claim_render_mode(
    assets: &mut SceneAssets,
    wanted: RenderMode,
    resource: u16,
    kind: ResourceKind,
) -> Result<(), SceneError> {
    match assets.render_mode {
        RenderMode::Unset => {
            assets.render_mode = wanted;
            Ok(())
        }
        current if current == wanted => Ok(()),
        current => Err(SceneError::ModeConflict {
            resource,
            kind,
            mode: current,
        }),
    }
}
