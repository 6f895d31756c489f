impl std::fmt::Debug for crate::Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Person")
            .field("state", &self.state)
            .field("days", &self.days_in_state)
            .field("grade", &self.spreader_grade)
            .field("age", &self.age)
            .finish()
    }
}

impl std::fmt::Debug for crate::Counts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counts")
            .field("S", &self.susceptible)
            .field("E", &self.incubating)
            .field("A", &self.asymptomatic)
            .field("C", &self.carrying)
            .field("I", &self.ill)
            .field("R", &self.recovered)
            .field("V", &self.vaccinated)
            .field("D", &self.died)
            .finish()
    }
}

impl std::fmt::Debug for crate::Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Listing every person is never useful.
        f.debug_struct("Population")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("wrap", &self.wrap)
            .finish()
    }
}

impl std::fmt::Debug for crate::State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("t", &self.t)
            .field("counts", &self.counts)
            .field("stable_days", &self.stable_days)
            .field("population", &self.population)
            .field("next_intervention", &self.interventions.next)
            .finish()
    }
}
