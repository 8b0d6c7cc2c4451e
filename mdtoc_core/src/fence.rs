/// Returns true when `line` opens or closes a fenced code block: optional
/// leading whitespace followed by three backticks or three tildes.
pub fn is_fence_delimiter(line: &str) -> bool {
	let rest = line.trim_start();
	rest.starts_with("```") || rest.starts_with("~~~")
}

/// Line classifier that tracks whether a scan is currently inside a fenced
/// code block.
///
/// Both delimiter styles toggle the same state, so a block opened with
/// backticks can be closed by tildes. Delimiter lines themselves are
/// reported as inside the fence. Create a fresh tracker for every scan.
#[derive(Debug, Default, Clone)]
pub struct FenceTracker {
	in_fence: bool,
}

impl FenceTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Classify the next line of the scan.
	pub fn is_inside_fence(&mut self, line: &str) -> bool {
		if is_fence_delimiter(line) {
			self.in_fence = !self.in_fence;
			return true;
		}

		self.in_fence
	}

	/// The state left behind by the last classified line.
	pub fn in_fence(&self) -> bool {
		self.in_fence
	}
}
