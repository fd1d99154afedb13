use std::fmt;
use std::num::{NonZeroI32, NonZeroU32};

/// Number of a surface in the surface register.
///
/// Always positive. The half-space side is carried by [`SignedSurf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfId(NonZeroU32);

impl SurfId {
    /// Creates a surface number, or `None` for zero or a value that cannot
    /// be negated as an `i32`.
    #[must_use]
    pub fn new(number: u32) -> Option<Self> {
        if i32::try_from(number).is_err() {
            return None;
        }
        NonZeroU32::new(number).map(Self)
    }

    /// Returns the raw surface number.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Reference to the positive side of this surface.
    #[must_use]
    pub fn positive(self) -> SignedSurf {
        SignedSurf::from_parts(self, true)
    }

    /// Reference to the negative side of this surface.
    #[must_use]
    pub fn negative(self) -> SignedSurf {
        SignedSurf::from_parts(self, false)
    }
}

impl fmt::Display for SurfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed reference to one side of a surface.
///
/// Positive values select the outside half-space (implicit function > 0),
/// negative values the inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignedSurf(NonZeroI32);

impl SignedSurf {
    /// Creates a signed reference, or `None` for zero or `i32::MIN`.
    #[must_use]
    pub fn new(value: i32) -> Option<Self> {
        if value == i32::MIN {
            return None;
        }
        NonZeroI32::new(value).map(Self)
    }

    /// Builds a reference from a surface number and a sense.
    #[must_use]
    pub fn from_parts(id: SurfId, positive: bool) -> Self {
        // SurfId::new guarantees the number fits in i32 and is non-zero.
        let magnitude = i32::try_from(id.get()).unwrap_or(i32::MAX);
        let value = if positive { magnitude } else { -magnitude };
        Self(NonZeroI32::new(value).unwrap_or(NonZeroI32::MAX))
    }

    /// Returns the signed integer value.
    #[must_use]
    pub fn get(self) -> i32 {
        self.0.get()
    }

    /// Returns the referenced surface number.
    #[must_use]
    pub fn id(self) -> SurfId {
        SurfId(self.0.unsigned_abs())
    }

    /// Returns `true` if this selects the positive half-space.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0.is_positive()
    }

    /// The same surface, opposite side.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self(-self.0)
    }

    /// Re-targets this reference at `id`, keeping the sense.
    #[must_use]
    pub fn with_id(self, id: SurfId) -> Self {
        Self::from_parts(id, self.is_positive())
    }
}

impl fmt::Display for SignedSurf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of a cell in the object register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(NonZeroU32);

impl CellId {
    /// Creates a cell number, or `None` for zero.
    #[must_use]
    pub fn new(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(Self)
    }

    /// Returns the raw cell number.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns the cell `offset` numbers after this one.
    #[must_use]
    pub fn offset(self, offset: u32) -> Option<Self> {
        self.0.checked_add(offset).map(Self)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
