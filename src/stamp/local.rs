//! Concurrent stamping into a shared parent solver.

use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::Result;
use crate::matrix::{ElementId, VectorElementId};
use crate::numeric::Scalar;
use crate::solver::{MatrixLocation, Solver};

#[derive(Debug, Clone, Copy)]
enum Target {
    Matrix(ElementId),
    Rhs(VectorElementId),
}

impl Target {
    fn read<T: Scalar>(self, parent: &Solver<T>) -> T {
        match self {
            Target::Matrix(id) => parent.value(id),
            Target::Rhs(id) => parent.rhs_value(id),
        }
    }

    fn write<T: Scalar>(self, parent: &mut Solver<T>, value: T) {
        match self {
            Target::Matrix(id) => parent.set_value(id, value),
            Target::Rhs(id) => parent.set_rhs_value(id, value),
        }
    }

    fn accumulate<T: Scalar>(self, parent: &mut Solver<T>, value: T) {
        match self {
            Target::Matrix(id) => parent.add(id, value),
            Target::Rhs(id) => parent.add_rhs(id, value),
        }
    }
}

/// One parent location and the additions not yet flushed into it.
#[derive(Debug)]
struct LocalCell<T> {
    target: Target,
    owner: usize,
    shared: AtomicBool,
    pending: Mutex<T>,
}

impl<T: Scalar> LocalCell<T> {
    fn new(target: Target, owner: usize) -> Self {
        Self {
            target,
            owner,
            shared: AtomicBool::new(false),
            pending: Mutex::new(T::zero()),
        }
    }

    /// Record a request from `task`.
    fn claim(&self, task: usize) {
        if task != self.owner && !self.shared.swap(true, Ordering::AcqRel) {
            debug!(owner = self.owner, task, target = ?self.target, "location is now shared");
        }
    }
}

/// A parent [`Solver`] that several tasks may stamp into at once.
///
/// Each task works through its own [`LocalSolver`]. Requests for a location
/// are resolved under one registry lock, so concurrent first requests get
/// the same cell. Additions go to the cell under its own mutex and reach
/// the parent on [`flush`](Self::flush). Reads and overwrites go straight
/// to the parent element.
///
/// Locks are taken in the order element registry, rhs registry, parent,
/// cell. Holding the guard from [`lock`](Self::lock) while reading or
/// overwriting through a [`LocalElement`] on the same thread deadlocks.
#[derive(Debug)]
pub struct SharedSolver<T: Scalar> {
    parent: Mutex<Solver<T>>,
    elements: Mutex<HashMap<MatrixLocation, Arc<LocalCell<T>>>>,
    rhs: Mutex<HashMap<usize, Arc<LocalCell<T>>>>,
}

impl<T: Scalar> SharedSolver<T> {
    pub fn new(parent: Solver<T>) -> Self {
        Self {
            parent: Mutex::new(parent),
            elements: Mutex::new(HashMap::new()),
            rhs: Mutex::new(HashMap::new()),
        }
    }

    /// A stamping view for `task`.
    pub fn local(&self, task: usize) -> LocalSolver<'_, T> {
        LocalSolver { shared: self, task }
    }

    fn element(&self, task: usize, row: usize, column: usize) -> Result<LocalElement<'_, T>> {
        let mut registry = self.elements.lock();
        let location = MatrixLocation::new(row, column);
        if let Some(cell) = registry.get(&location) {
            cell.claim(task);
            return Ok(LocalElement::new(self, Arc::clone(cell)));
        }
        let id = self.parent.lock().get_element(row, column)?;
        if id.is_trash() {
            return Ok(LocalElement::ground(self));
        }
        let cell = Arc::new(LocalCell::new(Target::Matrix(id), task));
        registry.insert(location, Arc::clone(&cell));
        Ok(LocalElement::new(self, cell))
    }

    fn rhs_element(&self, task: usize, row: usize) -> Result<LocalElement<'_, T>> {
        let mut registry = self.rhs.lock();
        if let Some(cell) = registry.get(&row) {
            cell.claim(task);
            return Ok(LocalElement::new(self, Arc::clone(cell)));
        }
        let id = self.parent.lock().get_rhs_element(row)?;
        if id.is_trash() {
            return Ok(LocalElement::ground(self));
        }
        let cell = Arc::new(LocalCell::new(Target::Rhs(id), task));
        registry.insert(row, Arc::clone(&cell));
        Ok(LocalElement::new(self, cell))
    }

    /// Add every pending contribution to the parent and clear it.
    pub fn flush(&self) {
        let elements = self.elements.lock();
        let rhs = self.rhs.lock();
        let mut parent = self.parent.lock();
        for cell in elements.values().chain(rhs.values()) {
            let value = mem::replace(&mut *cell.pending.lock(), T::zero());
            if !value.is_zero() {
                cell.target.accumulate(&mut parent, value);
            }
        }
    }

    /// Exclusive access to the parent, for ordering, factoring and solving.
    ///
    /// Pending additions are not included until [`flush`](Self::flush).
    pub fn lock(&self) -> MutexGuard<'_, Solver<T>> {
        self.parent.lock()
    }

    /// Number of registered locations that more than one task requested.
    pub fn shared_locations(&self) -> usize {
        shared_count(&self.elements.lock()) + shared_count(&self.rhs.lock())
    }

    /// Flush and return the parent solver.
    pub fn into_inner(self) -> Solver<T> {
        self.flush();
        self.parent.into_inner()
    }
}

fn shared_count<K, T>(cells: &HashMap<K, Arc<LocalCell<T>>>) -> usize {
    cells
        .values()
        .filter(|cell| cell.shared.load(Ordering::Acquire))
        .count()
}

/// One task's view of a [`SharedSolver`].
#[derive(Debug, Clone, Copy)]
pub struct LocalSolver<'a, T: Scalar> {
    shared: &'a SharedSolver<T>,
    task: usize,
}

impl<'a, T: Scalar> LocalSolver<'a, T> {
    pub fn task(&self) -> usize {
        self.task
    }

    pub fn get_element(&self, row: usize, column: usize) -> Result<LocalElement<'a, T>> {
        self.shared.element(self.task, row, column)
    }

    pub fn get_rhs_element(&self, row: usize) -> Result<LocalElement<'a, T>> {
        self.shared.rhs_element(self.task, row)
    }
}

/// Handle to one parent location. Ground handles discard every write.
#[derive(Debug)]
pub struct LocalElement<'a, T: Scalar> {
    shared: &'a SharedSolver<T>,
    cell: Option<Arc<LocalCell<T>>>,
}

impl<'a, T: Scalar> Clone for LocalElement<'a, T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared,
            cell: self.cell.clone(),
        }
    }
}

impl<'a, T: Scalar> LocalElement<'a, T> {
    fn new(shared: &'a SharedSolver<T>, cell: Arc<LocalCell<T>>) -> Self {
        Self {
            shared,
            cell: Some(cell),
        }
    }

    fn ground(shared: &'a SharedSolver<T>) -> Self {
        Self { shared, cell: None }
    }

    pub fn is_ground(&self) -> bool {
        self.cell.is_none()
    }

    /// Whether another task also requested this location.
    pub fn is_shared(&self) -> bool {
        self.cell
            .as_ref()
            .is_some_and(|cell| cell.shared.load(Ordering::Acquire))
    }

    /// Queue an addition for the next flush.
    pub fn add(&self, value: T) {
        if let Some(cell) = &self.cell {
            *cell.pending.lock() += value;
        }
    }

    /// Queue a subtraction for the next flush.
    pub fn subtract(&self, value: T) {
        if let Some(cell) = &self.cell {
            *cell.pending.lock() -= value;
        }
    }

    /// The parent element's value, counting additions not yet flushed.
    pub fn value(&self) -> T {
        let Some(cell) = &self.cell else {
            return T::zero();
        };
        let parent = self.shared.parent.lock();
        let pending = *cell.pending.lock();
        cell.target.read(&parent) + pending
    }

    /// Overwrite the parent element, discarding additions not yet flushed.
    pub fn set_value(&self, value: T) {
        if let Some(cell) = &self.cell {
            let mut parent = self.shared.parent.lock();
            let mut pending = cell.pending.lock();
            cell.target.write(&mut parent, value);
            *pending = T::zero();
        }
    }
}
