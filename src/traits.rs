/// Atomic number of an atom weight; `0` for pseudo atoms.
pub trait HasAtomicNum {
    fn atomic_num(&self) -> u8;
}

/// Drawn 2D position, y-up.
pub trait HasPosition2D {
    fn position_2d(&self) -> Option<[f64; 2]>;
}
