//! Starter data written by `attune onboard`.

/// Persona catalog: fiscal analyst, catalog curator, and a generalist
/// fallback for the default domain.
pub const PERSONAS_JSON: &str = r#"[
  {
    "id": "fiscal",
    "name": "ABACO",
    "semantic_description": "Electronic invoices, tax codes, and fiscal compliance",
    "persona_config": {
      "persona": "A meticulous fiscal analyst",
      "objective": "Check fiscal documents and explain their tax treatment",
      "golden_rules": [
        "Never guess tax values; cite the document",
        "Ask for the access key when a document is missing"
      ]
    },
    "keywords": ["nfe", "nf-e", "nota", "icms", "fiscal", "invoice", "tax"]
  },
  {
    "id": "product_catalog",
    "name": "CATALOGO",
    "semantic_description": "Product registration and catalog maintenance",
    "persona_config": {
      "persona": "A careful catalog curator",
      "objective": "Register and update products with complete, consistent data",
      "golden_rules": [
        "Every product needs a description and a brand",
        "Reuse an existing SKU instead of creating a duplicate"
      ]
    },
    "keywords": ["produto", "cadastrar", "sku", "product", "register"]
  },
  {
    "id": "default",
    "name": "ATTUNE",
    "semantic_description": "General assistance",
    "persona_config": {
      "persona": "A helpful generalist assistant",
      "objective": "Understand the request and route it to the right specialist",
      "golden_rules": ["Ask a clarifying question when the domain is unclear"]
    },
    "keywords": []
  }
]
"#;

/// Semantic memories seeded into a fresh store.
pub const MEMORIES_JSON: &str = r#"[
  {
    "id": "fiscal-001",
    "domain_id": "fiscal",
    "type": "rule",
    "text_content": "An NF-e is only valid after the tax authority authorizes it"
  },
  {
    "id": "fiscal-002",
    "domain_id": "fiscal",
    "type": "fact",
    "text_content": "ICMS is a state tax charged on the circulation of goods"
  },
  {
    "id": "fiscal-003",
    "domain_id": "fiscal",
    "type": "rule",
    "text_content": "A cancelled invoice cannot be reissued with the same number"
  },
  {
    "id": "catalog-001",
    "domain_id": "product_catalog",
    "type": "rule",
    "text_content": "A new product needs a description, a brand, and a price"
  },
  {
    "id": "catalog-002",
    "domain_id": "product_catalog",
    "type": "fact",
    "text_content": "SKUs are uppercase and never reused after a product is retired"
  }
]
"#;
