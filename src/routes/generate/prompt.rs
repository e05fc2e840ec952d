use super::model::GenerationMethod;

/// Shape of the JSON object the model must answer with.
pub const OUTPUT_FORMAT: &str = r#"{"newCategories":"string[]","newItems":"{name: string; category: string}[]","newListName":"string","newListItems":"{name: string; category: string; quantity: number}[]"}"#;

/// Text the model answers with when the input is unusable.
pub const BAD_PROMPT: &str = "Error: bad prompt";

const SHARED_RULES: &str = "newCategories and newItems should reference items and their categories \
that are not already present in the user data. newListName is a descriptive name for the list \
you're creating e.g. \"Pasta recipe\", and newListItems is an array that references items' names, \
their categories, and quantity (integer, default: 1) as required in your list. If you are \
referencing a user's existing item, use the exact same name in the newListItem. newItem names \
should be unique and identify any details or measurements e.g. \"Salt (2 tsp)\". If the detail can \
be expressed in whole numbers between 0 and 100 such as quantity of a fruit, instead specify it as \
a newListItem quantity and leave it out of the newItem name. Limit the number of items and \
categories you create to 25. Ensure newListItems only contains items and categories that are being \
created or exist in the user data. Ensure your response is a valid JSON object.";

pub fn system_instruction(method: GenerationMethod) -> String {
    let (intro, fallback) = match method {
        GenerationMethod::Prompt => (
            "You are a helpful assistant for a shopping list app who generates lists based on a \
             prompt, and data on associated items and their categories. The prompt is prepended \
             with a user's existing items and categories.",
            "If the prompt is unclear take your best guess. If the prompt is empty, unrelated to \
             shopping list generation or otherwise harmful or abusive",
        ),
        GenerationMethod::Url => (
            "You are a helpful assistant for a shopping list app who analyzes recipe instructions \
             from user-provided webpage content and generates a list and data on associated items \
             and their categories. The content is mostly unprocessed so you must determine the \
             page subject and extract relevant information i.e. ingredients on a pizza recipe \
             page. The text content is prepended with a user's existing items and categories.",
            "If the webpage content is unclear take your best guess. If the webpage content is \
             empty, unrelated to items in a list or otherwise harmful or abusive",
        ),
        GenerationMethod::Image => (
            "You are a helpful assistant for a shopping list app who generates lists based on \
             content from user-submitted images, and data on associated items and their \
             categories. Attached should be an image file you should analyze and use to create a \
             response, as well as a user's existing items and categories.",
            "If the image is unclear take your best guess. If the image is missing, unrelated to \
             items in a list or otherwise harmful or abusive",
        ),
    };

    format!(
        "{intro} You can choose from them when creating a shopping list as well as specify any new \
         items and categories that should be created for it. Respond with a structured JSON object \
         formatted as:\n{OUTPUT_FORMAT}\n{SHARED_RULES} {fallback}, simply respond with \"{BAD_PROMPT}\""
    )
}
