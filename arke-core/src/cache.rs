//! The spatial object cache: id/owner/location indices with line-of-sight queries, all
//! mutating and querying operations serialized behind a single re-entrant mutex. Queries
//! return deep clones so callers cannot alias live state.
//!
//! The mutex is re-entrant (`parking_lot::ReentrantMutex`) because several operations below
//! call each other while already holding the lock, e.g. `get_in_owner_los` calling the
//! per-cell lookup.
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use parking_lot::ReentrantMutex;

/// A game object occupying a rectangle of cells. `(x, y)` is the root cell; the rectangle is
/// `width * height` cells with `(x, y)` at its origin. `payload` carries whatever
/// game-specific data the handlers need; the cache only reasons about geometry and ownership.
#[derive(Debug, Clone)]
pub struct MapObject<T> {
    pub id: u64,
    pub owner: u64,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub updatable: bool,
    pub payload: T,
}

impl<T> MapObject<T> {
    fn is_root(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }
}

struct CacheState<T> {
    origin_x: i32,
    origin_y: i32,
    width: u32,
    height: u32,
    id_idx: HashMap<u64, MapObject<T>>,
    owner_idx: HashMap<u64, Vec<u64>>,
    loc_idx: Vec<Option<u64>>,
    updatable_order: Vec<u64>,
}

impl<T> CacheState<T> {
    fn cell(&self, x: i32, y: i32) -> Option<usize> {
        if x < self.origin_x
            || y < self.origin_y
            || x >= self.origin_x + self.width as i32
            || y >= self.origin_y + self.height as i32
        {
            return None;
        }
        let col = (x - self.origin_x) as usize;
        let row = (y - self.origin_y) as usize;
        Some(row * self.width as usize + col)
    }

    /// Clamp `[start, start+len)` to `[origin, origin+extent)`, returning `(clamped_start,
    /// clamped_len)`, or `None` if the result is empty.
    fn clamp_range(origin: i32, extent: u32, start: i32, len: u32) -> Option<(i32, u32)> {
        let lo = start.max(origin);
        let hi = (start.saturating_add(len as i32)).min(origin + extent as i32);
        if hi <= lo {
            None
        } else {
            Some((lo, (hi - lo) as u32))
        }
    }

    fn clamped_rect(&self, x: i32, y: i32, width: u32, height: u32) -> Option<(i32, i32, u32, u32)> {
        let (cx, cw) = Self::clamp_range(self.origin_x, self.width, x, width)?;
        let (cy, ch) = Self::clamp_range(self.origin_y, self.height, y, height)?;
        Some((cx, cy, cw, ch))
    }
}

pub struct SpatialCache<T> {
    inner: ReentrantMutex<RefCell<CacheState<T>>>,
}

impl<T: Clone> SpatialCache<T> {
    pub fn new(origin_x: i32, origin_y: i32, width: u32, height: u32) -> SpatialCache<T> {
        let size = width as usize * height as usize;
        SpatialCache {
            inner: ReentrantMutex::new(RefCell::new(CacheState {
                origin_x,
                origin_y,
                width,
                height,
                id_idx: HashMap::new(),
                owner_idx: HashMap::new(),
                loc_idx: vec![None; size],
                updatable_order: Vec::new(),
            })),
        }
    }

    /// Clamps to bounds, verifies every cell in the rectangle is empty, and paints the object
    /// in on success. No state change if any cell is already occupied.
    #[allow(clippy::too_many_arguments)]
    pub fn add_map_object(
        &self,
        id: u64,
        owner: u64,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        updatable: bool,
        payload: T,
    ) -> bool {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();

        let Some((cx, cy, cw, ch)) = state.clamped_rect(x, y, width, height) else {
            return false;
        };

        for row in 0..ch {
            for col in 0..cw {
                let idx = state.cell(cx + col as i32, cy + row as i32).unwrap();
                if state.loc_idx[idx].is_some() {
                    return false;
                }
            }
        }

        for row in 0..ch {
            for col in 0..cw {
                let idx = state.cell(cx + col as i32, cy + row as i32).unwrap();
                state.loc_idx[idx] = Some(id);
            }
        }

        if owner != 0 {
            state.owner_idx.entry(owner).or_default().push(id);
        }
        if updatable {
            state.updatable_order.push(id);
        }

        state.id_idx.insert(
            id,
            MapObject {
                id,
                owner,
                x,
                y,
                width,
                height,
                updatable,
                payload,
            },
        );
        true
    }

    /// Clears every cell the object occupies and unregisters it from the id/owner/updatable
    /// indices.
    pub fn remove_map_object(&self, id: u64) -> bool {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();

        let Some(object) = state.id_idx.remove(&id) else {
            return false;
        };

        let Some((cx, cy, cw, ch)) = state.clamped_rect(object.x, object.y, object.width, object.height) else {
            return true;
        };

        for row in 0..ch {
            for col in 0..cw {
                let idx = state.cell(cx + col as i32, cy + row as i32).unwrap();
                state.loc_idx[idx] = None;
            }
        }

        if let Some(owned) = state.owner_idx.get_mut(&object.owner) {
            owned.retain(|&owned_id| owned_id != id);
        }
        state.updatable_order.retain(|&updatable_id| updatable_id != id);
        true
    }

    /// Returns a clone of whatever object occupies `(x, y)`, root or not.
    pub fn get_at(&self, x: i32, y: i32) -> Option<MapObject<T>> {
        let guard = self.inner.lock();
        let state = guard.borrow();
        let idx = state.cell(x, y)?;
        let id = state.loc_idx[idx]?;
        state.id_idx.get(&id).cloned()
    }

    /// Returns every object whose footprint intersects the rectangle, each included only once
    /// (at its root cell) regardless of how much of its footprint falls inside the rectangle.
    pub fn get_in_rectangle(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<MapObject<T>> {
        let guard = self.inner.lock();
        let state = guard.borrow();
        let Some((cx, cy, cw, ch)) = state.clamped_rect(x, y, width, height) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in 0..ch {
            for col in 0..cw {
                let px = cx + col as i32;
                let py = cy + row as i32;
                let idx = state.cell(px, py).unwrap();
                if let Some(id) = state.loc_idx[idx] {
                    if let Some(object) = state.id_idx.get(&id) {
                        if object.is_root(px, py) && seen.insert(id) {
                            out.push(object.clone());
                        }
                    }
                }
            }
        }
        out
    }

    /// Every distinct non-zero owner with an occupying object (root or not) inside the
    /// `los_radius` box around `(x, y)`, clamped to bounds.
    pub fn get_users_with_los_at(&self, x: i32, y: i32, los_radius: u32) -> HashSet<u64> {
        let guard = self.inner.lock();
        let state = guard.borrow();
        let side = los_radius * 2 + 1;
        let Some((cx, cy, cw, ch)) = state.clamped_rect(x - los_radius as i32, y - los_radius as i32, side, side)
        else {
            return HashSet::new();
        };

        let mut owners = HashSet::new();
        for row in 0..ch {
            for col in 0..cw {
                let idx = state.cell(cx + col as i32, cy + row as i32).unwrap();
                if let Some(id) = state.loc_idx[idx] {
                    if let Some(object) = state.id_idx.get(&id) {
                        if object.owner != 0 {
                            owners.insert(object.owner);
                        }
                    }
                }
            }
        }
        owners
    }

    /// The union of `los_radius` boxes around every `map_object` owned by `owner`, each root
    /// object emitted once. `bbox`, if given, filters results to objects whose origin lies
    /// within it.
    pub fn get_in_owner_los(
        &self,
        owner: u64,
        los_radius: u32,
        bbox: Option<(i32, i32, u32, u32)>,
    ) -> Vec<MapObject<T>> {
        let guard = self.inner.lock();
        let state = guard.borrow();

        let Some(owned_ids) = state.owner_idx.get(&owner) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let side = los_radius * 2 + 1;

        for &owned_id in owned_ids {
            let Some(origin) = state.id_idx.get(&owned_id) else {
                continue;
            };
            let Some((cx, cy, cw, ch)) =
                state.clamped_rect(origin.x - los_radius as i32, origin.y - los_radius as i32, side, side)
            else {
                continue;
            };

            for row in 0..ch {
                for col in 0..cw {
                    let px = cx + col as i32;
                    let py = cy + row as i32;
                    let idx = state.cell(px, py).unwrap();
                    if let Some(id) = state.loc_idx[idx] {
                        if seen.contains(&id) {
                            continue;
                        }
                        if let Some(object) = state.id_idx.get(&id) {
                            if object.is_root(px, py) {
                                if let Some((bx, by, bw, bh)) = bbox {
                                    if object.x < bx || object.y < by || object.x >= bx + bw as i32 || object.y >= by + bh as i32
                                    {
                                        continue;
                                    }
                                }
                                seen.insert(id);
                                out.push(object.clone());
                            }
                        }
                    }
                }
            }
        }
        out
    }

    pub fn is_area_empty(&self, x: i32, y: i32, width: u32, height: u32) -> bool {
        self.get_in_rectangle(x, y, width, height).is_empty()
    }

    pub fn is_location_in_los(&self, owner: u64, x: i32, y: i32, los_radius: u32) -> bool {
        self.get_users_with_los_at(x, y, los_radius).contains(&owner)
    }

    /// Acquire the cache for the duration of an update tick. The returned session is the only
    /// way to call `next_updatable`, so the "must hold the lock to iterate updatables"
    /// invariant is enforced by the type system rather than a runtime thread-id check.
    pub fn begin_update(&self) -> UpdateSession<'_, T> {
        let guard = self.inner.lock();
        UpdateSession { cache: self, guard }
    }
}

pub struct UpdateSession<'a, T> {
    cache: &'a SpatialCache<T>,
    guard: parking_lot::ReentrantMutexGuard<'a, RefCell<CacheState<T>>>,
}

impl<'a, T: Clone> UpdateSession<'a, T> {
    /// Returns a clone of the updatable object at `pos` in iteration order, or `None` past the
    /// end.
    pub fn next_updatable(&self, pos: usize) -> Option<MapObject<T>> {
        let state = self.guard.borrow();
        let id = *state.updatable_order.get(pos)?;
        state.id_idx.get(&id).cloned()
    }

    pub fn end_update(self) {
        drop(self);
    }
}

impl<'a, T> Drop for UpdateSession<'a, T> {
    fn drop(&mut self) {
        let _ = self.cache;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> SpatialCache<()> {
        SpatialCache::new(0, 0, 64, 64)
    }

    #[test]
    fn add_then_remove_restores_prior_state() {
        let cache = cache();
        assert!(cache.add_map_object(1, 10, 5, 5, 2, 2, false, ()));
        assert!(cache.remove_map_object(1));

        assert!(cache.get_at(5, 5).is_none());
        assert!(cache.get_in_owner_los(10, 3, None).is_empty());
    }

    #[test]
    fn overlapping_add_leaves_state_unchanged() {
        let cache = cache();
        assert!(cache.add_map_object(1, 1, 0, 0, 2, 2, false, ()));
        assert!(!cache.add_map_object(2, 2, 1, 1, 2, 2, false, ()));

        let at = cache.get_at(1, 1).unwrap();
        assert_eq!(at.id, 1);
    }

    #[test]
    fn rectangle_queries_deduplicate_by_root_cell() {
        let cache = cache();
        cache.add_map_object(1, 1, 0, 0, 3, 3, false, ());

        let found = cache.get_in_rectangle(0, 0, 3, 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn los_symmetry_around_an_owners_object() {
        let cache = cache();
        cache.add_map_object(1, 7, 10, 10, 1, 1, false, ());

        assert!(cache.get_users_with_los_at(12, 12, 3).contains(&7));
        assert!(!cache.get_users_with_los_at(20, 20, 3).contains(&7));
        assert!(cache.is_location_in_los(7, 12, 12, 3));
        assert!(!cache.is_location_in_los(7, 20, 20, 3));
    }

    #[test]
    fn cloned_query_results_do_not_alias_cache_state() {
        let cache: SpatialCache<i32> = SpatialCache::new(0, 0, 16, 16);
        cache.add_map_object(1, 1, 0, 0, 1, 1, false, 100);

        let mut clone = cache.get_at(0, 0).unwrap();
        clone.payload = 999;

        assert_eq!(clone.payload, 999);
        assert_eq!(cache.get_at(0, 0).unwrap().payload, 100);
    }

    #[test]
    fn updatable_iteration_follows_insertion_order() {
        let cache = cache();
        cache.add_map_object(1, 1, 0, 0, 1, 1, true, ());
        cache.add_map_object(2, 1, 5, 5, 1, 1, true, ());
        cache.add_map_object(3, 1, 9, 9, 1, 1, false, ());

        let session = cache.begin_update();
        assert_eq!(session.next_updatable(0).unwrap().id, 1);
        assert_eq!(session.next_updatable(1).unwrap().id, 2);
        assert!(session.next_updatable(2).is_none());
        session.end_update();
    }

    #[test]
    fn owner_los_bounding_box_filters_by_origin() {
        let cache = cache();
        cache.add_map_object(1, 5, 0, 0, 1, 1, false, ());
        cache.add_map_object(2, 5, 40, 40, 1, 1, false, ());

        let filtered = cache.get_in_owner_los(5, 3, Some((0, 0, 10, 10)));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }
}
