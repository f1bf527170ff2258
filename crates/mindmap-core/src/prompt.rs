//! Instruction text sent to the generator.

/// System instruction that seeds every generation run.
pub const MINDMAP_INSTRUCTION: &str = r#"You are a knowledge visualization expert. Turn the source document into a COMPREHENSIVE mind map in CTM format. The map must stand on its own: a reader should learn everything important without opening the source.

# CTM FORMAT

- Root: `Label`
- Level 1: `>Label`
- Level 2: `>>Label`
- Level N: N x `>`
- Optional attributes: `>Label|key:value,key2:value2`

Rules:
- One node per line, no blank lines.
- No spaces before, between or after the `>` markers.
- The first line is the root and has no `>`.
- Go deeper by EXACTLY one `>` at a time. Every node at level N needs a parent at level N-1.
- Escape literal separators in labels: `\|` `\:` `\,` `\>` `\\`

# DEPTH

Aim for 4-6 levels where the content supports it:
- Level 1: main themes (3-7 branches)
- Level 2: key concepts (3-8 each)
- Level 3: specific details
- Level 4+: concrete data, examples, numbers, steps

Labels carry substance (definitions, examples, figures, causes and effects), not just topic names. Write labels in the language of the source.

# EXAMPLE

Photosynthesis
>Inputs
>>Light energy (absorbed by chlorophyll)
>>Water (split at photosystem II)
>>Carbon dioxide|source:stomata
>Stages
>>Light-dependent reactions
>>>Thylakoid membrane
>>>Produce ATP and NADPH
>>Calvin cycle
>>>Stroma
>>>Fixes CO2 via RuBisCO

# COMMON ERROR

Root
>Child
>>>Wrong: level 3 directly under level 1

# OUTPUT

Return ONLY the CTM text. No explanations, no markdown code fences."#;

/// Corrective message appended after a rejected attempt.
pub fn correction_message(diagnostic: &str) -> String {
    format!(
        "CTM format validation failed: {diagnostic}. \
         Please fix the error and regenerate the mindmap following the CTM rules strictly."
    )
}
