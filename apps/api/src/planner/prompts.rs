// All LLM prompt templates for the planner.
// Templates use `{placeholder}` markers filled by the builders in recommend.rs / itinerary.rs.

/// Recommendation prompt template.
/// Replace: {num_people}, {travel_styles}, {budget}, {custom_prompt}, {history_instruction}
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"You are a travel recommendation expert specializing in personalized trips.
A group of {num_people} traveling from India has shared their preferences:

1. **Travel Styles:** {travel_styles}
2. **Total Budget for the Group (INR):** ₹{budget}
3. **Specific User Requirements:** "{custom_prompt}"
{history_instruction}
Based on all of these preferences, recommend a single, specific travel destination (a city, national park, or region).
The destination can be within India or international, but it must be realistically achievable within the given budget for this group traveling from India.

Respond with ONLY a JSON object with EXACTLY these fields, and no other text or markdown:
{
  "name": "Destination Name",
  "description": "A compelling, 2-3 sentence description of why this place fits the group's styles, budget, and requirements.",
  "image": "a photographic search phrase for a picture of this place (NOT a URL)"
}"#;

/// Appended when the session has already shown destinations.
/// Replace: {previous}
pub const HISTORY_INSTRUCTION_TEMPLATE: &str = "
IMPORTANT: The following destinations were already suggested. Do NOT recommend any of them again; pick somewhere different: {previous}
";

pub const NO_CUSTOM_PROMPT_RECOMMEND: &str = "None specified. Feel free to be creative.";
pub const NO_CUSTOM_PROMPT_ITINERARY: &str = "None";

/// Itinerary prompt template.
/// Replace: {num_people}, {destination}, {budget}, {travel_styles}, {custom_prompt}
pub const ITINERARY_PROMPT_TEMPLATE: &str = r#"You are an expert travel planner. Create the best possible, detailed itinerary for a group of {num_people} traveling to {destination}.

Their travel profile is as follows:
- **Total Budget for the Group:** ₹{budget}
- **Desired Vibe/Styles:** {travel_styles}
- **Other User Notes:** "{custom_prompt}"

Determine the optimal duration for the trip based on the destination and budget. State the recommended duration clearly at the beginning.

Format the response as markdown: one heading per day, followed by a bullet list of that day's plan.
Each bullet MUST start with one of these keywords followed by a colon:
- "Food:" for dining, cafes, or culinary experiences.
- "Activity:" for sightseeing, tours, events, or general actions.
- "Stay:" for lodging or accommodation details.
- "Tip:" for helpful advice, notes, or transportation info.

Example bullets:
- Activity: Explore the ancient ruins of the Vijayanagara Empire.
- Food: Enjoy a traditional South Indian thali for lunch.

Return plain text only. Do NOT return JSON. Do NOT wrap the response in code fences."#;

/// Fills `{name}` placeholders in one pass. Substituted values are never
/// scanned again, and braces that do not name a known placeholder are kept.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Formats an amount with Indian digit grouping: 75000 → "75,000", 150000 → "1,50,000".
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{}", groups.join(","), last_three)
}

/// "1 person" / "5 people".
pub fn describe_party(num_people: u32) -> String {
    if num_people == 1 {
        "1 person".to_string()
    } else {
        format!("{num_people} people")
    }
}
