use serde_json::{json, Value};

/// A patent record shaped the way PatentsView returns it
pub fn raw_patent(number: &str, title: &str, date: &str) -> Value {
    json!({
        "patent_number": number,
        "patent_title": title,
        "patent_abstract": format!("Abstract of {title}"),
        "patent_date": date,
        "app_date": "2018-06-20",
        "assignees": [{"assignee_organization": "Example Corp"}],
        "inventors": [{"inventor_name_first": "John", "inventor_name_last": "Doe"}],
        "claims": [
            {"claim_number": 1, "claim_text": "A method comprising..."},
            {"claim_number": 2, "claim_text": "The method of claim 1..."}
        ],
        "cited_patents": [{"cited_patent_number": "9999999"}],
        "citedby_patents": [{"citedby_patent_number": "10000001"}],
        "ipc_classes": [{"ipc_class": "G06F"}]
    })
}

pub fn page(patents: Vec<Value>, total_pages: u32) -> String {
    json!({
        "patents": patents,
        "count": patents.len(),
        "total_pages": total_pages,
    })
    .to_string()
}
