mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn lookup_crud_roundtrip() -> Result<()> {
    let Some(server) = common::start_server().await? else {
        return Ok(());
    };
    let suffix = common::unique_suffix();
    let descricao = format!("Pais {}", suffix);

    let id = server
        .create("/api/paises", &json!({ "descricao": format!("  {}  ", descricao) }), "idtipo_pais")
        .await?;

    let (status, row) = server.get(&format!("/api/paises/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["descricao"], descricao.as_str());

    // Case-insensitive duplicate
    let (status, body) = server
        .post("/api/paises", &json!({ "descricao": descricao.to_uppercase() }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    let (status, body) = server
        .get(&format!("/api/paises/check-existing?descricao={}", descricao.replace(' ', "%20")))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);

    let (status, body) = server
        .get(&format!(
            "/api/paises/check-existing?descricao={}&excludeId={}",
            descricao.replace(' ', "%20"),
            id
        ))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], false);

    let renamed = format!("Pais renomeado {}", suffix);
    let (status, row) = server
        .put(&format!("/api/paises/{}", id), &json!({ "descricao": renamed }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["descricao"], renamed.as_str());

    let (status, body) = server.delete(&format!("/api/paises/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = server.get(&format!("/api/paises/{}", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "País não encontrado(a)");

    let (status, _) = server.delete(&format!("/api/paises/{}", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn paginated_search_returns_meta() -> Result<()> {
    let Some(server) = common::start_server().await? else {
        return Ok(());
    };
    let suffix = common::unique_suffix();

    for i in 0..3 {
        server
            .create(
                "/api/componentes",
                &json!({ "descricao": format!("Componente {} {}", suffix, i) }),
                "idcomponente",
            )
            .await?;
    }

    let (status, body) = server
        .get(&format!("/api/componentes/paginated?page=1&limit=2&search={}", suffix))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["totalPages"], 2);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["limit"], 2);

    let (_, body) = server
        .get(&format!("/api/componentes/paginated?page=2&limit=2&search={}", suffix))
        .await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (_, body) = server.get("/api/componentes/paginated?search=%25nada%25casa%25").await?;
    assert_eq!(body["meta"]["total"], 0);
    assert_eq!(body["meta"]["totalPages"], 0);
    Ok(())
}

#[tokio::test]
async fn municipios_reference_estado() -> Result<()> {
    let Some(server) = common::start_server().await? else {
        return Ok(());
    };
    let suffix = common::unique_suffix();
    let short = &suffix[suffix.len() - 5..];

    let estado = server
        .create(
            "/api/estados",
            &json!({ "codigo": short, "descricao": format!("Estado {}", suffix) }),
            "idtipo_estado",
        )
        .await?;

    let (status, body) = server
        .post(
            "/api/municipios",
            &json!({ "codigo": format!("M{}", short), "descricao": "Cidade", "tipo_estado_idtipo_estado": i64::MAX }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Estado não encontrado");

    let municipio = server
        .create(
            "/api/municipios",
            &json!({ "codigo": format!("M{}", short), "descricao": format!("Cidade {}", suffix), "tipo_estado_idtipo_estado": estado }),
            "idtipo_municipio",
        )
        .await?;

    let (status, row) = server.get(&format!("/api/municipios/{}", municipio)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["estado_descricao"], format!("Estado {}", suffix).as_str());

    let (_, rows) = server.get(&format!("/api/municipios/by-estado/{}", estado)).await?;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));

    let (_, page) = server
        .get(&format!("/api/municipios/paginated?tipo_estado={}", estado))
        .await?;
    assert_eq!(page["meta"]["total"], 1);

    // Same name in the same state is a conflict
    let (status, _) = server
        .post(
            "/api/municipios",
            &json!({ "codigo": format!("N{}", short), "descricao": format!("cidade {}", suffix), "tipo_estado_idtipo_estado": estado }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // A referenced estado cannot be deleted
    let (status, body) = server.delete(&format!("/api/estados/{}", estado)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap_or_default().contains("possui registros vinculados"));

    server.delete(&format!("/api/municipios/{}", municipio)).await?;
    let (status, _) = server.delete(&format!("/api/estados/{}", estado)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn habilitacao_codes_are_uppercased() -> Result<()> {
    let Some(server) = common::start_server().await? else {
        return Ok(());
    };
    let suffix = common::unique_suffix();
    let codigo = format!("h-{}", &suffix[suffix.len() - 8..]);

    let (status, row) = server
        .post(
            "/api/tipo-habilitacao",
            &json!({ "codigo": codigo, "descricao": format!("Habilitação {}", suffix) }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row["codigo"], codigo.to_uppercase().as_str());

    let (_, body) = server
        .get(&format!("/api/tipo-habilitacao/check-existing?codigo={}", codigo))
        .await?;
    assert_eq!(body["exists"], true);

    let id = row["idtipo_habilitacao"].as_i64().unwrap_or_default();
    let (status, body) = server
        .get(&format!("/api/tipo-habilitacao/check-existing-codigo?codigo={}", codigo))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);

    let (_, body) = server
        .get(&format!("/api/tipo-habilitacao/check-existing-codigo?codigo={}&excludeId={}", codigo, id))
        .await?;
    assert_eq!(body["exists"], false);

    let (status, body) = server
        .get(&format!("/api/tipo-habilitacao/check-existing-descricao?descricao=Habilita%C3%A7%C3%A3o%20{}", suffix))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);

    let (status, _) = server.delete(&format!("/api/tipo-habilitacao/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
