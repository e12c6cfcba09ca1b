use std::fmt;

/// Identity of a read pair: the two mate sequences, compared byte for byte.
///
/// Read names and qualities play no part in equality or hashing.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ReadKey {
    mate1: Box<[u8]>,
    mate2: Box<[u8]>,
}

impl ReadKey {
    pub fn new(mate1: impl Into<Box<[u8]>>, mate2: impl Into<Box<[u8]>>) -> Self {
        ReadKey {
            mate1: mate1.into(),
            mate2: mate2.into(),
        }
    }

    pub fn mate1(&self) -> &[u8] {
        &self.mate1
    }

    pub fn mate2(&self) -> &[u8] {
        &self.mate2
    }
}

impl fmt::Debug for ReadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReadKey({}, {})",
            String::from_utf8_lossy(&self.mate1),
            String::from_utf8_lossy(&self.mate2)
        )
    }
}
