/// Electricity collected during the current level.
#[derive(Debug, Default)]
pub(crate) struct Economy {
    electricity: u32,
}

impl Economy {
    pub(crate) fn electricity(&self) -> u32 {
        self.electricity
    }

    pub(crate) fn deposit(&mut self, amount: u32) -> u32 {
        self.electricity = self.electricity.saturating_add(amount);
        self.electricity
    }
}
