//! Entity store with per-component-type sparse storage
//!
//! Entities are generational arena ids; each component type lives in its own
//! sparse set keyed by entity index. Queries intersect the listed component
//! storages, anchored on the first listed type, so callers should lead with
//! the narrowest component (usually a tag).
//!
//! The store is single-threaded. Passes that mutate while iterating collect
//! the matching ids up front and queue destruction through a marker component
//! rather than destroying mid-query.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// A unique identifier for an entity.
///
/// Combines an index with a generation counter so that a recycled index
/// invalidates any stale handles still pointing at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Raw slot index (stable while the entity is alive)
    pub fn index(&self) -> u32 {
        self.index
    }
}

const NO_DENSE: u32 = u32::MAX;

/// Sparse-set storage for a single component type
pub struct SparseSet<T> {
    sparse: Vec<u32>,
    entities: Vec<Entity>,
    data: Vec<T>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            data: Vec::new(),
        }
    }
}

impl<T> SparseSet<T> {
    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let slot = *self.sparse.get(entity.index as usize)?;
        if slot == NO_DENSE {
            return None;
        }
        // A stale handle may alias a recycled index; the dense row knows the
        // generation it was inserted with.
        if self.entities[slot as usize] != entity {
            return None;
        }
        Some(slot as usize)
    }

    /// Attach or overwrite the component for `entity`
    pub fn insert(&mut self, entity: Entity, value: T) {
        if let Some(dense) = self.dense_index(entity) {
            self.data[dense] = value;
            return;
        }
        let index = entity.index as usize;
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, NO_DENSE);
        }
        self.sparse[index] = self.entities.len() as u32;
        self.entities.push(entity);
        self.data.push(value);
    }

    /// Remove the component, swap-filling the dense arrays
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let dense = self.dense_index(entity)?;
        self.sparse[entity.index as usize] = NO_DENSE;
        let moved = *self.entities.last().expect("dense row exists");
        self.entities.swap_remove(dense);
        let value = self.data.swap_remove(dense);
        if dense < self.entities.len() {
            self.sparse[moved.index as usize] = dense as u32;
        }
        Some(value)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(|i| &mut self.data[i])
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities currently holding this component, in insertion order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

/// Type-erased storage operations needed by the world
trait AnyStorage {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove_entity(&mut self, entity: Entity);
    fn clear(&mut self);
    fn contains_entity(&self, entity: Entity) -> bool;
    fn entities(&self) -> &[Entity];
}

impl<T: 'static> AnyStorage for SparseSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.data.clear();
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

/// The entity registry: id arena + one sparse set per component type
#[derive(Default)]
pub struct World {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh entity id
    pub fn create(&mut self) -> Entity {
        if let Some(index) = self.free.pop() {
            self.alive[index as usize] = true;
            Entity {
                index,
                generation: self.generations[index as usize],
            }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Destroy an entity and detach all of its components.
    ///
    /// Destroying an already-dead entity is a programmer error.
    pub fn destroy(&mut self, entity: Entity) {
        debug_assert!(self.valid(entity), "destroy of invalid entity {entity:?}");
        if !self.valid(entity) {
            return;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        let index = entity.index as usize;
        self.alive[index] = false;
        self.generations[index] += 1;
        self.free.push(entity.index);
    }

    /// Is this id still referring to a live entity?
    pub fn valid(&self, entity: Entity) -> bool {
        let index = entity.index as usize;
        index < self.generations.len()
            && self.alive[index]
            && self.generations[index] == entity.generation
    }

    /// Destroy every entity
    pub fn clear(&mut self) {
        for storage in self.storages.values_mut() {
            storage.clear();
        }
        self.free.clear();
        for (index, alive) in self.alive.iter_mut().enumerate() {
            if *alive {
                *alive = false;
                self.generations[index] += 1;
            }
            self.free.push(index as u32);
        }
    }

    fn storage<T: 'static>(&self) -> Option<&SparseSet<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref())
    }

    fn storage_mut<T: 'static>(&mut self) -> &mut SparseSet<T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(SparseSet::<T>::default()))
            .as_any_mut()
            .downcast_mut()
            .expect("storage type matches its TypeId key")
    }

    /// Attach (or overwrite) a component on a live entity
    pub fn emplace<T: 'static>(&mut self, entity: Entity, value: T) {
        debug_assert!(self.valid(entity), "emplace on invalid entity {entity:?}");
        self.storage_mut::<T>().insert(entity, value);
    }

    /// Component reference, or `None` if absent or the entity is dead
    pub fn try_get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    pub fn try_get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()?
            .get_mut(entity)
    }

    /// Component reference; panics when absent (programmer error — go through
    /// `try_get` for liveness-checked access)
    pub fn get<T: 'static>(&self, entity: Entity) -> &T {
        self.try_get(entity)
            .unwrap_or_else(|| panic!("entity {entity:?} has no {}", std::any::type_name::<T>()))
    }

    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> &mut T {
        self.try_get_mut(entity)
            .unwrap_or_else(|| panic!("entity {entity:?} has no {}", std::any::type_name::<T>()))
    }

    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|s| s.contains(entity))
    }

    /// Number of entities holding component `T`
    pub fn size<T: 'static>(&self) -> usize {
        self.storage::<T>().map_or(0, SparseSet::len)
    }

    fn entities_of(&self, type_id: TypeId) -> &[Entity] {
        self.storages.get(&type_id).map_or(&[], |s| s.entities())
    }

    fn has_raw(&self, type_id: TypeId, entity: Entity) -> bool {
        self.storages
            .get(&type_id)
            .is_some_and(|s| s.contains_entity(entity))
    }

    /// Lazy iterator over every entity holding all components in `S`.
    ///
    /// Restartable; anchored on the first listed component's storage.
    /// Creating entities or destroying not-yet-visited ones during iteration
    /// is not supported — collect the ids first when the pass mutates.
    pub fn view<S: ComponentSet>(&self) -> impl Iterator<Item = Entity> + '_ {
        S::anchor(self)
            .iter()
            .copied()
            .filter(move |&e| S::matches(self, e))
    }
}

/// A set of component types to intersect in a query
pub trait ComponentSet {
    /// Entity list of the anchor (first listed) component
    fn anchor(world: &World) -> &[Entity];
    /// Does the entity hold every non-anchor component?
    fn matches(world: &World, entity: Entity) -> bool;
}

macro_rules! impl_component_set {
    ($head:ident $(, $tail:ident)*) => {
        impl<$head: 'static $(, $tail: 'static)*> ComponentSet for ($head, $($tail,)*) {
            fn anchor(world: &World) -> &[Entity] {
                world.entities_of(TypeId::of::<$head>())
            }

            #[allow(unused_variables)]
            fn matches(world: &World, entity: Entity) -> bool {
                true $(&& world.has_raw(TypeId::of::<$tail>(), entity))*
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
