//! A value slot with an authored base and an optional runtime override.

/// Effective value is the override when present, otherwise the base.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overridable<T> {
    base: T,
    override_value: Option<T>,
}

impl<T> Overridable<T> {
    pub fn new(base: T) -> Self {
        Self {
            base,
            override_value: None,
        }
    }

    #[inline]
    pub fn get(&self) -> &T {
        self.override_value.as_ref().unwrap_or(&self.base)
    }

    #[inline]
    pub fn base(&self) -> &T {
        &self.base
    }

    #[inline]
    pub fn set_base(&mut self, base: T) {
        self.base = base;
    }

    #[inline]
    pub fn set_override(&mut self, value: T) {
        self.override_value = Some(value);
    }

    #[inline]
    pub fn clear_override(&mut self) {
        self.override_value = None;
    }

    #[inline]
    pub fn is_overridden(&self) -> bool {
        self.override_value.is_some()
    }
}

impl<T: Copy> Overridable<T> {
    #[inline]
    pub fn value(&self) -> T {
        *self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_shadows_base_until_cleared() {
        let mut slot = Overridable::new(1.0f32);
        slot.set_override(3.0);
        assert_eq!(slot.value(), 3.0);
        slot.set_base(2.0);
        assert_eq!(slot.value(), 3.0);
        slot.clear_override();
        assert_eq!(slot.value(), 2.0);
        assert!(!slot.is_overridden());
    }
}
