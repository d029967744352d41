/// A fixed-size, row-major 2D buffer. Out-of-bounds access yields `None` instead of panicking
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Array2d<T: Default + Copy> {
	width: usize,
	height: usize,
	vec: Vec<T>,
}

impl<T: Default + Copy> Array2d<T> {
	pub fn new(width: usize, height: usize) -> Self {
		return Self { width, height, vec: vec![T::default(); width * height] };
	}

	fn index(&self, x: usize, y: usize) -> Option<usize> {
		if x < self.width && y < self.height {
			return Some(y * self.width + x);
		}
		return None;
	}

	pub fn get(&self, x: usize, y: usize) -> Option<T> {
		return self.index(x, y).map(|i| self.vec[i]);
	}

	pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
		let i = self.index(x, y)?;
		return Some(&mut self.vec[i]);
	}

	/// Returns whether `(x, y)` was in bounds
	pub fn set(&mut self, x: usize, y: usize, value: T) -> bool {
		match self.get_mut(x, y) {
			Some(slot) => { *slot = value; true },
			None => false,
		}
	}

	pub fn fill(&mut self, value: T) {
		for slot in self.vec.iter_mut() {
			*slot = value;
		}
	}

	/// Row `y` as a slice
	pub fn row(&self, y: usize) -> Option<&[T]> {
		if y >= self.height {
			return None;
		}
		return Some(&self.vec[y * self.width..(y + 1) * self.width]);
	}

	pub fn as_slice(&self) -> &[T] { &self.vec }
	pub fn width(&self) -> usize { self.width }
	pub fn height(&self) -> usize { self.height }
}
