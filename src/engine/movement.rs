//! Travel between map tiles.
//!
//! Distance is Manhattan distance on the tile grid. When several tiles
//! match a selector the nearest one wins; ties go to the first listed.

use super::actions;
use super::context::CharacterContext;
use super::{EngineError, EngineResult};
use crate::api::LocationQuery;
use crate::models::{calculate_distance, Character, Coords, Location, LocationSelector};

/// Nearest location matching `selector`, measured from `from`
pub fn nearest<'a>(
    from: Coords,
    candidates: &'a [Location],
    selector: &LocationSelector,
) -> Option<&'a Location> {
    candidates
        .iter()
        .filter(|loc| selector.matches(loc))
        .min_by_key(|loc| calculate_distance(from, loc.coords))
}

/// Move to `coords` unless already there. Returns whether a move was issued.
pub async fn move_to(
    ctx: &CharacterContext,
    character: &mut Character,
    coords: Coords,
) -> EngineResult<bool> {
    if character.position() == coords {
        return Ok(false);
    }
    actions::move_to(ctx, character, coords).await?;
    Ok(true)
}

/// Travel to the nearest location matching `selector`.
///
/// Fails with [`EngineError::NotFound`] if no tile matches. Returns the
/// destination coordinates.
pub async fn travel(
    ctx: &CharacterContext,
    character: &mut Character,
    selector: &LocationSelector,
) -> EngineResult<Coords> {
    let query = LocationQuery {
        kind: Some(selector.kind.clone()),
        code: Some(selector.code.clone()),
    };
    let locations = ctx.api().get_locations(&query).await?;
    let target = nearest(character.position(), &locations, selector)
        .ok_or_else(|| EngineError::NotFound(format!("location {}", selector)))?;
    let coords = target.coords;

    if move_to(ctx, character, coords).await? {
        ctx.log()
            .debug(format_args!("travelled to {} at {}", selector, coords));
    }
    Ok(coords)
}
