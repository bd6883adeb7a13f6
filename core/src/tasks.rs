//! Built-in task definitions for UX-research interview analysis.

use crate::error::Result;
use crate::registry::TaskDefinition;
use crate::schema::{Field, OutputSchema, Schema};

pub const EXTRACTION_TASK: &str = "ux_research_interview_analysis";
pub const SUMMARY_TASK: &str = "ux_research_interview_analysis_summary";

const ANALYSIS_MODEL: &str = "gpt-4o-mini";

const EXTRACTION_INSTRUCTION: &str = "\
Analyze the UX research interview transcript to extract the following information:
- user_problems: list of problems or pain points mentioned by the interviewee
- user_motivations: reasons or motivations behind the user's actions or choices
- current_tools: existing tools or methods mentioned that the user employs
- user_needs: specific needs or requirements expressed by the user
- success_metrics: indicators of what success looks like for the user
- user_context: relevant background information about the user's situation
Be thorough in your analysis and provide concise, factual insights. For the summary, focus on the key problems and needs identified. Think about the big picture and the underlying themes.
Also, keep in mind that one person is the interviewer and the other is the interviewee. We're interested in the interviewee's experiences and perspective.";

const EXTRACTION_PROMPT: &str = "\
Analyze the following UX research interview transcript for a pet adoption project:
{{ transcript }}";

const SUMMARY_INSTRUCTION: &str = "\
You are a UX research analyst tasked with writing a concise, insightful report based on a user interview transcript and extracted insights for a pet adoption project. Your report should focus on identifying and understanding problems, not suggesting solutions.

Focus on:
1. Summarizing key findings about user problems and pain points
2. Describing the current tools and processes users employ
3. Highlighting user needs and motivations
4. Identifying gaps between user needs and current solutions
5. Describing the context in which users operate

Write the report in markdown format, ensuring your insights provide a clear picture of the current situation and challenges in the pet adoption process.
Try to use the interviewee's own words and tone as much as possible. Try to incorporate direct quotes from the transcript (use markdown quotes or italics). Use their name in the report.";

const SUMMARY_PROMPT: &str = "\
Based on the following UX research interview transcript and extracted insights, write a concise report for the pet adoption project:

Transcript:
{{ transcript }}

Extracted Insights:
{{ extracted_insights }}

Provide a detailed report in markdown format, focusing on identifying problems, understanding the current situation, and highlighting user needs without suggesting solutions or next steps.
Do not include actionable next steps, challenges, metrics, or anything that suggests a solution. The goal is to understand the current situation and identify user problems, friction, and needs.";

/// Array of objects whose fields are all required strings.
fn record_list(description: &str, fields: &[(&str, &str)]) -> Schema {
    let fields = fields
        .iter()
        .map(|(name, text)| Field::required(*name, Schema::string().describe(*text)))
        .collect();
    Schema::array(Schema::object(fields)).describe(description)
}

pub fn extraction_schema() -> Result<OutputSchema> {
    let user_needs = Schema::array(Schema::object(vec![
        Field::required(
            "need",
            Schema::string().describe("Description of the user need"),
        ),
        Field::required(
            "importance",
            Schema::enumeration(["High", "Medium", "Low"]).describe("Importance level of the need"),
        ),
        Field::required(
            "current_solution",
            Schema::string().describe("How this need is currently being addressed, if at all"),
        ),
    ]))
    .describe("Specific needs or requirements expressed by the user");

    let schema = OutputSchema::new(
        EXTRACTION_TASK,
        Schema::object(vec![
            Field::required(
                "user_problems",
                record_list(
                    "List of problems or pain points mentioned by the interviewee",
                    &[
                        ("problem", "Brief description of the problem"),
                        ("context", "Relevant context or quote from the interview"),
                    ],
                ),
            ),
            Field::required(
                "opportunities",
                record_list(
                    "Potential solutions or improvements suggested or implied from the discussion",
                    &[
                        ("opportunity", "Brief description of the opportunity"),
                        ("potential_impact", "How this could improve the user experience"),
                    ],
                ),
            ),
            Field::required(
                "user_motivations",
                record_list(
                    "Reasons or motivations behind the user's actions or choices",
                    &[
                        ("motivation", "Description of the motivation"),
                        ("underlying_need", "The deeper need this motivation addresses"),
                    ],
                ),
            ),
            Field::required(
                "current_tools",
                record_list(
                    "Existing tools or methods mentioned that the user employs",
                    &[
                        ("tool", "Name or description of the tool"),
                        ("usage", "How the user is currently using this tool"),
                        ("limitations", "Any limitations or frustrations with the tool"),
                    ],
                ),
            ),
            Field::required("user_needs", user_needs),
            Field::required(
                "success_criteria",
                record_list(
                    "Indicators of what success looks like for the user",
                    &[
                        ("criterion", "Description of the success criterion"),
                        ("evaluation", "How this criterion could be evaluated or observed"),
                    ],
                ),
            ),
            Field::required(
                "feature_suggestions",
                record_list(
                    "Specific features, functionalities, or products suggested or implied as useful",
                    &[
                        (
                            "feature",
                            "Description of the suggested feature, functionality, or product",
                        ),
                        (
                            "user_benefit",
                            "How the feature, functionality, or product would benefit the user",
                        ),
                    ],
                ),
            ),
            Field::required(
                "analysis_summary",
                Schema::string().describe(
                    "A brief summary of key problems, needs, and current tools identified in the interview. \
                     Focus on factual observations without suggesting solutions.",
                ),
            ),
        ]),
    )?;
    Ok(schema.with_description("Extract insights from a UX research interview transcript"))
}

pub fn summary_schema() -> Result<OutputSchema> {
    let schema = OutputSchema::new(
        SUMMARY_TASK,
        Schema::object(vec![
            Field::required(
                "report",
                Schema::string().describe("The full report in markdown format"),
            ),
            Field::required(
                "key_takeaway",
                Schema::string().describe(
                    "A single sentence summarizing the most important problem or need identified",
                ),
            ),
        ]),
    )?;
    Ok(schema.with_description(
        "Write a concise report focusing on problems and current situation based on a user \
         interview transcript and extracted insights for a pet adoption project.",
    ))
}

pub fn extraction() -> Result<TaskDefinition> {
    Ok(
        TaskDefinition::new(EXTRACTION_TASK, EXTRACTION_INSTRUCTION, EXTRACTION_PROMPT)?
            .with_model(ANALYSIS_MODEL)
            .with_temperature(0.0)?
            .with_max_output_tokens(4096)?
            .with_output_schema(extraction_schema()?),
    )
}

pub fn summary() -> Result<TaskDefinition> {
    Ok(
        TaskDefinition::new(SUMMARY_TASK, SUMMARY_INSTRUCTION, SUMMARY_PROMPT)?
            .with_model(ANALYSIS_MODEL)
            .with_temperature(0.2)?
            .with_max_output_tokens(4096)?
            .with_output_schema(summary_schema()?),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extraction_schema_requires_every_section() {
        let doc = extraction_schema().unwrap().to_json_schema();
        assert_eq!(
            doc["required"],
            json!([
                "user_problems",
                "opportunities",
                "user_motivations",
                "current_tools",
                "user_needs",
                "success_criteria",
                "feature_suggestions",
                "analysis_summary"
            ])
        );
        assert_eq!(
            doc["properties"]["current_tools"]["items"]["required"],
            json!(["tool", "usage", "limitations"])
        );
    }

    #[test]
    fn extraction_schema_rejects_unknown_importance() {
        let value = json!({
            "user_problems": [],
            "opportunities": [],
            "user_motivations": [],
            "current_tools": [],
            "user_needs": [
                { "need": "clear steps", "importance": "Critical", "current_solution": "none" }
            ],
            "success_criteria": [],
            "feature_suggestions": [],
            "analysis_summary": "..."
        });
        let err = extraction_schema().unwrap().root().validate(&value).unwrap_err();
        assert_eq!(err.path, "$.user_needs[0].importance");
    }

    #[test]
    fn prompts_render_both_handoff_variables() {
        let variables = [
            ("transcript", "Jordan: the shelter never called back"),
            ("extracted_insights", "{\"user_problems\": []}"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let extraction = extraction().unwrap();
        let prompt = extraction.prompt_template().render(&variables).unwrap();
        assert!(prompt.ends_with("pet adoption project:\nJordan: the shelter never called back"));

        let summary = summary().unwrap();
        let prompt = summary.prompt_template().render(&variables).unwrap();
        assert!(prompt.contains("Transcript:\nJordan: the shelter never called back\n"));
        assert!(prompt.contains("Extracted Insights:\n{\"user_problems\": []}\n"));
        assert!(!prompt.contains("{{"));
    }
}
