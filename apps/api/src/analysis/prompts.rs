//! Prompt constants for the analysis endpoints. Templates use `{placeholder}`
//! substitution. The wording is part of the reply contract (JSON-only output,
//! fixed schema) — edit with care.

/// Analyze-flow prompt. Replace `{content}` before sending.
pub const ANALYZE_PROMPT_TEMPLATE: &str = r#"
You are a specialized job listing analyzer. Your task is to extract skills, technologies, and responsibilities from job listings.

INSTRUCTIONS:
1. Analyze the job listing content below.
2. Identify specific skills, technologies, and responsibilities mentioned.
3. Count how many times each term appears.
4. Group similar terms together (e.g., "React.js" and "React" should be counted as the same skill).
5. Categorize each term as either "responsibility" or "qualification".
6. Return ONLY a JSON object with the following structure:
   {
     "terms": [
       {"term": "skill or responsibility name", "count": number, "category": "responsibilities" or "qualifications"},
       ...
     ]
   }

IMPORTANT RULES:
- Focus on complete phrases rather than individual words (e.g., "product management" not just "product").
- Only include relevant professional skills and responsibilities.
- Do not include common words or generic phrases.
- Do not include any explanations or text outside the JSON structure.
- Ensure the JSON is valid and properly formatted.

JOB LISTING CONTENT:
{content}
"#;

/// Auto-flow research prompt. Replace `{company_line}`, `{sector_line}`,
/// `{role}` and `{experience}` before sending (`{role}` recurs — the model
/// drifts onto adjacent titles without the repetition).
pub const AUTO_GENERATE_PROMPT_TEMPLATE: &str = r#"
You are a specialized job market researcher. I need you to research current job listings for the following criteria and extract skills and responsibilities with their source information.

SEARCH CRITERIA:
- Role: {role}
- Experience Level: {experience}
{company_line}{sector_line}
CRITICAL ROLE MATCHING REQUIREMENTS:
- ONLY include job listings that match the EXACT role title "{role}" or very close variations
- For example, if the role is "Product Manager", include:
  ✓ "Product Manager"
  ✓ "Senior Product Manager"
  ✓ "Product Management"
  ✓ "Jr Product Manager"
  ✓ "Lead Product Manager"
- But DO NOT include:
  ✗ "Product Development Manager"
  ✗ "Product Data Manager"
  ✗ "Product Portfolio Manager"
  ✗ "Product Marketing Manager"
  ✗ Any role that adds significant additional words that change the core function

INSTRUCTIONS:
1. Research current job listings from this year that match these criteria
2. STRICTLY filter to only include listings where the job title closely matches "{role}"
3. Extract the most common responsibilities and qualifications/skills from these listings
4. For each term, include the company name and specific role title from the job listing where it was found
5. IMPORTANT: Only use ONE job listing per company (do not include multiple listings from the same company)
6. Focus on finding 15-25 of the most frequently mentioned items across different companies
7. Categorize each item as either "responsibilities" or "qualifications"
8. Return ONLY a JSON object with the following structure:
   {
     "terms": [
       {
         "term": "skill or responsibility name",
         "count": frequency_number,
         "category": "responsibilities" or "qualifications",
         "sources": [
           {"company": "Company Name", "role": "Specific Job Title"},
           {"company": "Another Company", "role": "Another Job Title"}
         ]
       },
       ...
     ],
     "totalListings": total_number_of_unique_job_listings_analyzed
   }

IMPORTANT RULES:
- Each term should be 2-3 words
- Only include relevant professional skills and responsibilities
- Do not include common words or generic phrases
- Count should reflect how frequently this appears across job listings (1-10 scale)
- Include 1-3 source examples per term showing real companies and job titles where this term appeared
- NEVER include multiple job listings from the same company - use only one listing per company
- STRICTLY adhere to the role title "{role}" - do not include tangentially related roles
- If no specific company is mentioned, use "Unknown Company". It should never be the job board (Indeed, Monster, Glassdoor, etc.)
- Ensure the JSON is valid and properly formatted
- Make sure all counts are numeric values, not objects or strings
- Include the total number of unique job listings analyzed in the "totalListings" field
- Do not include any explanations or text outside the JSON structure

EXAMPLE OUTPUT:
{
  "terms": [
    {
      "term": "React development",
      "count": 8,
      "category": "qualifications",
      "sources": [
        {"company": "Meta", "role": "Frontend Engineer"},
        {"company": "Netflix", "role": "Senior Software Engineer"},
        {"company": "Airbnb", "role": "Full Stack Developer"}
      ]
    },
    {
      "term": "team collaboration",
      "count": 7,
      "category": "responsibilities",
      "sources": [
        {"company": "Google", "role": "Software Engineer II"},
        {"company": "Microsoft", "role": "Senior Developer"}
      ]
    }
  ],
  "totalListings": 15
}

Please research and analyze job listings for the role "{role}" specifically and provide the extracted terms with their source information. Remember to use only ONE listing per company and STRICTLY match the role title.
"#;

/// Builds the analyze prompt from the pasted listing sections. Absent
/// sections render as "None provided" so the model sees both headings.
pub fn build_analyze_prompt(responsibilities: &str, qualifications: &str) -> String {
    let content = format!(
        "\nRESPONSIBILITIES:\n{}\n\nQUALIFICATIONS:\n{}\n",
        non_empty_or(responsibilities, "None provided"),
        non_empty_or(qualifications, "None provided"),
    );
    ANALYZE_PROMPT_TEMPLATE.replace("{content}", &content)
}

/// Builds the research prompt for the auto flow. Company and sector are
/// optional criteria lines; role and experience are interpolated everywhere
/// the template names them.
pub fn build_auto_generate_prompt(
    role: &str,
    experience: &str,
    company: Option<&str>,
    sector: Option<&str>,
) -> String {
    let company_line = company
        .map(|c| format!("- Company: {c}\n"))
        .unwrap_or_default();
    let sector_line = sector
        .map(|s| format!("- Sector: {s}\n"))
        .unwrap_or_default();

    AUTO_GENERATE_PROMPT_TEMPLATE
        .replace("{company_line}", &company_line)
        .replace("{sector_line}", &sector_line)
        .replace("{role}", role)
        .replace("{experience}", experience)
}

fn non_empty_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}
