use crate::{
    foundation::core::{Geometry, Size},
    foundation::error::{SceneError, SceneResult},
    layout::dimensions::resolve_dimensions,
    layout::fill::apply_resize,
    scene::model::Slot,
};

/// Resolve a slot's final placement on `canvas`: evaluate its dimensions, then apply its
/// resize policy (if any) to the evaluated target rectangle.
pub fn resolve_slot_geometry(slot: &Slot, canvas: Size) -> SceneResult<Geometry> {
    let target = resolve_dimensions(&slot.name, &slot.dimensions, canvas)?;
    match &slot.resize {
        None => Ok(target),
        Some(policy) => apply_resize(policy, target).map_err(|source| SceneError::Layout {
            slot: slot.name.clone(),
            source,
        }),
    }
}
