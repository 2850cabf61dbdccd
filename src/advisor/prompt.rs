use crate::farm::FarmSnapshot;

/// Renders the single-turn prompt sent to the advisory model.
pub fn build_prompt(snapshot: &FarmSnapshot, question: &str) -> String {
    format!(
        "You are a friendly AI farm advisor. Here are the current farming conditions:\n\
         - Weather: {weather}\n\
         - Temperature: {temperature}°F\n\
         - Moisture: {moisture}%\n\
         - Available Money: ${money}\n\
         - Current Day: {day}\n\
         \n\
         The player asks: \"{question}\"\n\
         \n\
         Provide brief, practical farming advice based on these conditions.",
        weather = snapshot.weather,
        temperature = snapshot.temperature,
        moisture = snapshot.moisture,
        money = snapshot.money,
        day = snapshot.day,
        question = question,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::StartingState, crops::CropCatalog, farm::FarmState};

    #[test]
    fn prompt_embeds_conditions_and_question() {
        let catalog = CropCatalog::default();
        let snapshot = FarmState::new(&StartingState::default(), 6, 6).snapshot(&catalog);
        let prompt = build_prompt(&snapshot, "Should I plant tomatoes?");
        assert!(prompt.starts_with("You are a friendly AI farm advisor."));
        assert!(prompt.contains("- Weather: sunny\n"));
        assert!(prompt.contains("- Temperature: 75°F\n"));
        assert!(prompt.contains("- Moisture: 60%\n"));
        assert!(prompt.contains("- Available Money: $1000\n"));
        assert!(prompt.contains("- Current Day: 1\n"));
        assert!(prompt.contains("The player asks: \"Should I plant tomatoes?\""));
        assert!(prompt.ends_with("based on these conditions."));
    }
}
