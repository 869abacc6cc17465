use super::LakehouseClient;
use crate::error::Result;
use crate::operations::catalog::{self, SchemaRef, TableRef};
use crate::patch::JsonPatchOperation;
use crate::pipeline::ResponseEnvelope;
use crate::transport::Transport;
use crate::types::{
    Catalog, CatalogCollection, Column, ColumnCollection, CreateSchema, Empty,
    ListTablesOptions, SchemaCollection, SuccessResponse, Table, TableCollection,
    TableSnapshotCollection,
};

impl<T: Transport> LakehouseClient<T> {
    pub async fn list_catalogs(&self) -> Result<ResponseEnvelope<CatalogCollection>> {
        self.execute(catalog::list_catalogs()).await
    }

    pub async fn get_catalog(&self, catalog_id: &str) -> Result<ResponseEnvelope<Catalog>> {
        self.execute(catalog::get_catalog(catalog_id)).await
    }

    pub async fn list_schemas(
        &self,
        engine_id: &str,
        catalog_id: &str,
    ) -> Result<ResponseEnvelope<SchemaCollection>> {
        self.execute(catalog::list_schemas(engine_id, catalog_id)).await
    }

    pub async fn create_schema(
        &self,
        engine_id: &str,
        catalog_id: &str,
        input: &CreateSchema,
    ) -> Result<ResponseEnvelope<SuccessResponse>> {
        self.execute(catalog::create_schema(engine_id, catalog_id, input))
            .await
    }

    pub async fn delete_schema(&self, schema: SchemaRef<'_>) -> Result<ResponseEnvelope<Empty>> {
        self.execute(catalog::delete_schema(schema)).await
    }

    pub async fn list_tables(
        &self,
        schema: SchemaRef<'_>,
        options: &ListTablesOptions,
    ) -> Result<ResponseEnvelope<TableCollection>> {
        self.execute(catalog::list_tables(schema, options)).await
    }

    pub async fn get_table(&self, table: TableRef<'_>) -> Result<ResponseEnvelope<Table>> {
        self.execute(catalog::get_table(table)).await
    }

    pub async fn update_table(
        &self,
        table: TableRef<'_>,
        patch: impl Into<Vec<JsonPatchOperation>>,
    ) -> Result<ResponseEnvelope<Table>> {
        let patch = patch.into();
        self.execute(catalog::update_table(table, &patch)).await
    }

    pub async fn delete_table(&self, table: TableRef<'_>) -> Result<ResponseEnvelope<Empty>> {
        self.execute(catalog::delete_table(table)).await
    }

    pub async fn list_columns(&self, table: TableRef<'_>) -> Result<ResponseEnvelope<ColumnCollection>> {
        self.execute(catalog::list_columns(table)).await
    }

    pub async fn add_columns(
        &self,
        table: TableRef<'_>,
        columns: &[Column],
    ) -> Result<ResponseEnvelope<ColumnCollection>> {
        self.execute(catalog::add_columns(table, columns)).await
    }

    pub async fn update_column(
        &self,
        table: TableRef<'_>,
        column_id: &str,
        patch: impl Into<Vec<JsonPatchOperation>>,
    ) -> Result<ResponseEnvelope<Column>> {
        let patch = patch.into();
        self.execute(catalog::update_column(table, column_id, &patch))
            .await
    }

    pub async fn delete_column(
        &self,
        table: TableRef<'_>,
        column_id: &str,
    ) -> Result<ResponseEnvelope<Empty>> {
        self.execute(catalog::delete_column(table, column_id)).await
    }

    pub async fn list_table_snapshots(
        &self,
        table: TableRef<'_>,
    ) -> Result<ResponseEnvelope<TableSnapshotCollection>> {
        self.execute(catalog::list_table_snapshots(table)).await
    }

    pub async fn rollback_table(
        &self,
        table: TableRef<'_>,
        snapshot_id: &str,
    ) -> Result<ResponseEnvelope<SuccessResponse>> {
        self.execute(catalog::rollback_table(table, snapshot_id)).await
    }
}
