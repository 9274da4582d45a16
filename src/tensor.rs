//! Shared parameter tensors
//!
//! A [`Tensor`] is a handle onto a flat `f32` buffer plus an optional gradient
//! buffer. Cloning a handle shares storage, so the model and the per-adapter
//! optimizers see the same parameter values.

use ndarray::Array1;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

#[derive(Debug)]
struct Storage {
    data: Array1<f32>,
    grad: Option<Array1<f32>>,
}

/// Reference-counted parameter tensor with gradient storage
#[derive(Debug, Clone)]
pub struct Tensor {
    storage: Rc<RefCell<Storage>>,
    shape: Vec<usize>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a tensor with an explicit shape
    ///
    /// # Panics
    /// Panics if `data.len()` does not match the product of `shape`.
    pub fn new(data: Array1<f32>, shape: Vec<usize>, requires_grad: bool) -> Self {
        assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "tensor data length must match shape"
        );
        Self { storage: Rc::new(RefCell::new(Storage { data, grad: None })), shape, requires_grad }
    }

    /// Create a 1-D tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        let len = data.len();
        Self::new(Array1::from(data), vec![len], requires_grad)
    }

    /// Create a 2-D tensor from row-major data
    pub fn from_shape_vec(rows: usize, cols: usize, data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), vec![rows, cols], requires_grad)
    }

    /// Create a 1-D tensor of zeros
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), vec![len], requires_grad)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Borrow the parameter values
    pub fn data(&self) -> Ref<'_, Array1<f32>> {
        Ref::map(self.storage.borrow(), |s| &s.data)
    }

    /// Mutably borrow the parameter values
    pub fn data_mut(&self) -> RefMut<'_, Array1<f32>> {
        RefMut::map(self.storage.borrow_mut(), |s| &mut s.data)
    }

    /// Copy of the current gradient, if any
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.storage.borrow().grad.clone()
    }

    /// Replace the gradient
    pub fn set_grad(&self, grad: Array1<f32>) {
        self.storage.borrow_mut().grad = Some(grad);
    }

    /// Add into the gradient buffer (backward passes accumulate)
    pub fn accumulate_grad(&self, grad: &Array1<f32>) {
        let mut storage = self.storage.borrow_mut();
        match storage.grad.as_mut() {
            Some(existing) => *existing += grad,
            None => storage.grad = Some(grad.clone()),
        }
    }

    /// Drop the accumulated gradient
    pub fn zero_grad(&self) {
        self.storage.borrow_mut().grad = None;
    }

    /// Whether two handles point at the same storage
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }
}
