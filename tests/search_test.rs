use catalog_graph::{
    CatalogError, EmbeddedGraphStore, EntityKind, FixedEmbeddings, HashingEmbedder,
    IngestionPipeline, LogicalModel, SearchConfig, SearchService, SourceDataset, SourceField,
    SourceReference,
};

fn field(id: &str, title: &str, description: &str) -> SourceField {
    SourceField {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        ..SourceField::default()
    }
}

fn sales_model() -> LogicalModel {
    LogicalModel {
        datasets: vec![
            SourceDataset {
                id: "orders".into(),
                title: "Orders".into(),
                description: "Customer orders and their revenue".into(),
                facts: vec![
                    field("order_revenue", "Order Revenue", "Revenue of the order"),
                    field("quantity", "Quantity", "Units ordered"),
                ],
                attributes: vec![
                    field("order_date", "Order Date", "Date the order was placed"),
                    field("order_status", "Order Status", "Status of the order"),
                ],
                references: vec![SourceReference::to("customers"), SourceReference::to("products")],
                ..SourceDataset::default()
            },
            SourceDataset {
                id: "customers".into(),
                title: "Customers".into(),
                description: "People who place orders".into(),
                attributes: vec![
                    field("customer_name", "Customer Name", "Name of the customer"),
                    field("customer_city", "Customer City", "City of the customer"),
                ],
                ..SourceDataset::default()
            },
            SourceDataset {
                id: "products".into(),
                title: "Products".into(),
                description: "Products for sale".into(),
                facts: vec![field("price", "Price", "Product price")],
                attributes: vec![field("product_category", "Product Category", "Category of the product")],
                ..SourceDataset::default()
            },
        ],
    }
}

fn ingested(embedder: &HashingEmbedder) -> EmbeddedGraphStore {
    let store = EmbeddedGraphStore::in_memory();
    IngestionPipeline::new(&store, embedder).run(&sales_model()).unwrap();
    store
}

#[test]
fn test_revenue_scenario() {
    let model = LogicalModel {
        datasets: vec![SourceDataset {
            id: "D1".into(),
            title: "Revenue".into(),
            description: "Total revenue".into(),
            facts: vec![field("F1", "Revenue Amount", "Amount of revenue")],
            ..SourceDataset::default()
        }],
    };
    let store = EmbeddedGraphStore::in_memory();
    let embedder = HashingEmbedder::new(768);
    IngestionPipeline::new(&store, &embedder).run(&model).unwrap();

    let hits = SearchService::new(&store, &embedder).search_all("revenue", 1).unwrap();
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert!(
        (hit.title == "Revenue" && hit.kind == EntityKind::Dataset)
            || (hit.title == "Revenue Amount" && hit.kind == EntityKind::Fact)
    );
    assert!((0.0..=1.0).contains(&hit.score));
}

#[test]
fn test_closer_embedding_wins() {
    let model = LogicalModel {
        datasets: vec![SourceDataset {
            id: "D1".into(),
            title: "Revenue".into(),
            description: "Total revenue".into(),
            facts: vec![field("F1", "Revenue Amount", "Amount of revenue")],
            ..SourceDataset::default()
        }],
    };
    let embedder = FixedEmbeddings::new(3)
        .with("Revenue\nTotal revenue", vec![0.6, 0.8, 0.0])
        .with("Revenue Amount\nAmount of revenue", vec![0.9, 0.1, 0.1])
        .with("revenue", vec![1.0, 0.0, 0.0]);
    let store = EmbeddedGraphStore::in_memory();
    IngestionPipeline::new(&store, &embedder).run(&model).unwrap();

    let hits = SearchService::new(&store, &embedder).search_all("revenue", 1).unwrap();
    assert_eq!(hits[0].title, "Revenue Amount");
    assert_eq!(hits[0].kind, EntityKind::Fact);
}

#[test]
fn test_scores_non_increasing() {
    let embedder = HashingEmbedder::new(768);
    let store = ingested(&embedder);
    let service = SearchService::new(&store, &embedder);

    for query in ["order revenue", "customer city", "product price", "date"] {
        let hits = service.search_all(query, 5).unwrap();
        assert_eq!(hits.len(), 5);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score, "{:?} ranked above {:?}", pair[0], pair[1]);
        }
    }
}

#[test]
fn test_type_filter() {
    let embedder = HashingEmbedder::new(768);
    let store = ingested(&embedder);
    let service = SearchService::new(&store, &embedder);

    for kind in EntityKind::ALL {
        let hits = service.search_by_type("order revenue", 3, kind).unwrap();
        assert!(!hits.is_empty());
        assert!(hits.len() <= 3);
        assert!(hits.iter().all(|h| h.kind == kind));
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}

#[test]
fn test_type_pool_is_configurable() {
    let embedder = HashingEmbedder::new(768);
    let store = ingested(&embedder);

    // 3 datasets + 3 facts + 5 attributes
    let config = SearchConfig {
        type_pool: 11,
        ..SearchConfig::default()
    };
    let service = SearchService::with_config(&store, &embedder, config);
    let attributes = service.search_by_type("order", 10, EntityKind::Attribute).unwrap();
    assert_eq!(attributes.len(), 5);
}

#[test]
fn test_children_rows_have_parents() {
    let embedder = HashingEmbedder::new(768);
    let store = ingested(&embedder);
    let service = SearchService::new(&store, &embedder);

    let rows = service.search_by_children("orders", 11).unwrap();
    // Every entity was fetched; only the 8 contained ones come back
    assert_eq!(rows.len(), 8);
    for row in &rows {
        assert!(
            row.child.starts_with("Fact: ") || row.child.starts_with("Attribute: "),
            "unexpected child {}",
            row.child
        );
        assert!(["Orders", "Customers", "Products"].contains(&row.parent_title.as_str()));
    }

    let order_date = rows.iter().find(|r| r.child == "Attribute: Order Date").unwrap();
    assert_eq!(order_date.parent_title, "Orders");
}

#[test]
fn test_search_without_index_is_empty() {
    let store = EmbeddedGraphStore::in_memory();
    let embedder = HashingEmbedder::new(768);
    let service = SearchService::new(&store, &embedder);

    assert!(service.search_all("anything", 5).unwrap().is_empty());
    assert!(service.search_by_type("anything", 5, EntityKind::Fact).unwrap().is_empty());
    assert!(service.search_by_children("anything", 5).unwrap().is_empty());
}

#[test]
fn test_invalid_queries_release_sessions() {
    let embedder = HashingEmbedder::new(768);
    let store = ingested(&embedder);
    let service = SearchService::new(&store, &embedder);

    assert!(matches!(service.search_all("", 5), Err(CatalogError::InvalidQuery(_))));
    assert!(matches!(
        service.search_by_children("orders", 0),
        Err(CatalogError::InvalidQuery(_))
    ));
    assert!(matches!(
        service.search_by_type("orders", 100, EntityKind::Fact),
        Err(CatalogError::InvalidQuery(_))
    ));

    // A query embedded with the wrong model fails inside the store
    let other = HashingEmbedder::new(16);
    let mismatched = SearchService::new(&store, &other);
    assert!(matches!(mismatched.search_all("orders", 5), Err(CatalogError::StoreQuery(_))));
    assert_eq!(store.open_sessions(), 0);
}
