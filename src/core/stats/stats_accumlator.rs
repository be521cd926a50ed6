use std::collections::HashMap;
use std::fmt::*;

#[derive(Debug, Default)]
pub struct StatsAccumulator {
    counters: HashMap<String, u64>,
    memory_counters: HashMap<String, u64>,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        StatsAccumulator {
            counters: HashMap::new(),
            memory_counters: HashMap::new(),
        }
    }

    pub fn report_counter(&mut self, name: &str, val: u64) {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += val;
    }

    pub fn report_memory_counter(&mut self, name: &str, val: u64) {
        let counter = self.memory_counters.entry(name.to_string()).or_insert(0);
        *counter += val;
    }

    pub fn counter(&self, name: &str) -> u64 {
        return self.counters.get(name).copied().unwrap_or(0);
    }

    pub fn memory_counter(&self, name: &str) -> u64 {
        return self.memory_counters.get(name).copied().unwrap_or(0);
    }

    pub fn counters(&self) -> Vec<(String, u64)> {
        let mut items: Vec<(String, u64)> =
            self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect();
        items.sort();
        return items;
    }
}

fn get_category_and_title(name: &str) -> (String, String) {
    let mut parts = name.splitn(2, '/');
    let category = parts.next().unwrap_or("");
    let title = if let Some(t) = parts.next() { t } else { "" };
    (category.to_string(), title.to_string())
}

#[cfg(feature = "stats")]
impl Display for StatsAccumulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let mut to_print: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in self.counters.iter() {
            if *value == 0 {
                continue;
            }
            let (category, title) = get_category_and_title(name);
            to_print
                .entry(category)
                .or_default()
                .push(format!("{:<42}{:>12}", title, value));
        }
        for (name, value) in self.memory_counters.iter() {
            if *value == 0 {
                continue;
            }
            let (category, title) = get_category_and_title(name);
            let kib = *value as f64 / 1024.0;
            to_print
                .entry(category)
                .or_default()
                .push(format!("{:<42}{:>9.2} kB", title, kib));
        }
        let mut categories: Vec<_> = to_print.into_iter().collect();
        categories.sort();
        write!(f, "  Statistics:\n")?;
        for (category, mut items) in categories {
            items.sort();
            write!(f, "    {}\n", category)?;
            for item in items.iter() {
                write!(f, "      {}\n", item)?;
            }
        }
        Ok(())
    }
}

#[cfg(not(feature = "stats"))]
impl Display for StatsAccumulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for (name, value) in self.counters() {
            let (category, title) = get_category_and_title(&name);
            write!(f, "{} {}: {}\n", category, title, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_sum_by_name() {
        let mut accum = StatsAccumulator::new();
        accum.report_counter("BVH/Leaf nodes", 3);
        accum.report_counter("BVH/Leaf nodes", 4);
        assert_eq!(accum.counter("BVH/Leaf nodes"), 7);
        assert_eq!(accum.counter("BVH/Interior nodes"), 0);
    }
}
